//! 离线增强示例
//!
//! 不访问网络，对几条手写的原始记录运行完整管道并写入 SQLite

use etl::{JobPipeline, JobStore, PipelineConfig, RawJobRecord, TracingObserver};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== 离线增强示例 ===\n");

    // 1. 准备原始记录
    let raw = vec![
        RawJobRecord::new(json!({
            "id": "1001",
            "title": "Senior Python Developer",
            "company": { "display_name": "Oracle México" },
            "location": { "display_name": "Zapopan, Jalisco", "area": ["México", "Jalisco", "Zapopan"] },
            "description": "Remote role building data pipelines on AWS with Docker.",
            "salary_min": 60000,
            "salary_max": 80000,
            "created": "2024-03-30T09:15:00Z"
        })),
        RawJobRecord::new(json!({
            "id": "1002",
            "title": "Desarrollador Jr. React",
            "company": { "display_name": "Startup GDL" },
            "location": { "display_name": "Guadalajara, Jalisco" },
            "description": "Trabajo híbrido, javascript y node",
            "salary_min": "n/d",
            "created": "2024-04-02"
        })),
        RawJobRecord::new(json!({
            "id": "1001",
            "title": "Duplicate posting"
        })),
    ];

    // 2. 运行管道
    let pipeline = JobPipeline::new(&PipelineConfig::default())?;
    let output = pipeline.process(&raw, &TracingObserver);

    println!("\n增强后的记录:");
    for (i, record) in output.records.iter().enumerate() {
        println!(
            "  {}. {} @ {}",
            i + 1,
            record.job.title.as_deref().unwrap_or("N/A"),
            record.job.company.as_deref().unwrap_or("N/A")
        );
        println!(
            "     等级: {}  远程: {}  大厂: {}  关键词: {:?}",
            record.features.experience_level,
            record.features.is_remote,
            record.features.is_big_tech,
            record.features.mentioned_tech_keywords
        );
        if let Some(calendar) = &record.calendar {
            println!(
                "     发布: {} {} {} ({})",
                calendar.day_name, calendar.day, calendar.month_name, calendar.year
            );
        }
    }

    // 3. 持久化
    let store = JobStore::new("sqlite::memory:").await?;
    let jobs: Vec<_> = output.records.iter().map(|r| r.job.clone()).collect();
    let saved = store.save_records(&jobs).await?;
    let stats = store.stats().await?;

    println!("\n保存 {} 条，库中共 {} 条（{} 条有日期）", saved, stats.total_jobs, stats.dated_jobs);
    println!("\n=== 示例完成 ===");

    Ok(())
}
