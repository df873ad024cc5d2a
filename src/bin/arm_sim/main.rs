//! 无界面演示：运行演示场景并定期打印渲染快照
//!
//! 用法：`cargo run --features demo --bin arm_sim -- [秒数]`
//! 日志级别由 RUST_LOG 控制。

use arm_engine::sync::demo_input;
use arm_engine::{get_config, Scene};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seconds: f32 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(10.0);

    if let Err(e) = run(seconds) {
        log::error!("[演示] 运行失败: {}", e);
        std::process::exit(1);
    }
}

fn run(seconds: f32) -> arm_engine::Result<()> {
    let config = get_config();
    let dt = config.fixed_dt();
    let frames = (seconds / dt).ceil() as u32;
    let report_every = config.physics_fps.round().max(1.0) as u32;

    let mut scene = Scene::demo()?;
    let mut source = demo_input();

    for frame in 0..frames {
        let input = scene.frame_from(&mut source, dt)?;
        if frame % report_every == 0 {
            log::info!("[演示] t={:.2}s 旋转={:.1}°", scene.elapsed(), input.rotation_deg);
            for item in scene.render_snapshot()? {
                let pose = item.transform.decompose()?;
                let euler = pose.euler_deg();
                log::info!(
                    "  {:<8} {:?} 位置=({:.3}, {:.3}, {:.3}) 欧拉=({:.1}, {:.1}, {:.1})",
                    item.name,
                    item.kind,
                    pose.position.x,
                    pose.position.y,
                    pose.position.z,
                    euler.x,
                    euler.y,
                    euler.z
                );
            }
        }
    }

    log::info!("[演示] 完成 {} 帧", scene.frame_count());
    Ok(())
}
