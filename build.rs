use chrono::Utc;

fn main() {
    // Stamp the build time, reported by /api/health / 构建时间，由健康检查接口返回
    let build_time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);

    println!("cargo:rerun-if-changed=build.rs");
}
