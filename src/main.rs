//! # InstaFilter — 命令行入口
//!
//! 本文件仅负责日志初始化、参数解析与服务组装。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use instafilter::error::AppError;
use instafilter::filter::{
    FilterKind, FilterService, ImageSource, ParameterKey, PipelineConfig, PipelineObserver,
    RenderedOutput,
};
use instafilter::settings::{JsonFileStore, PreferenceStore};

#[derive(Debug, Parser)]
#[command(name = "instafilter", version, about = "Apply photo filters from the command line")]
struct Cli {
    /// 配置文件（JSON），缺省使用内置默认值
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 偏好目录，缺省为系统配置目录下的 instafilter
    #[arg(long, global = true)]
    settings_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 对图片应用滤镜并写出结果
    Apply {
        /// 输入图片
        input: PathBuf,
        /// 输出路径，格式由扩展名决定
        #[arg(short, long)]
        output: PathBuf,
        /// 滤镜，例如 sepia-tone、gaussian-blur
        #[arg(short, long)]
        filter: Option<String>,
        #[arg(long)]
        intensity: Option<f64>,
        #[arg(long)]
        radius: Option<f64>,
        #[arg(long)]
        scale: Option<f64>,
    },
    /// 列出可用滤镜及其参数
    List,
    /// 查看当前滤镜切换计数
    Usage,
}

/// 命令行下的评分请求仅做提示。
struct ConsoleObserver;

impl PipelineObserver for ConsoleObserver {
    fn output_changed(&mut self, output: Option<&RenderedOutput>) {
        match output {
            Some(output) => log::debug!("输出已更新：{}x{}", output.width(), output.height()),
            None => log::debug!("本次渲染无新输出"),
        }
    }

    fn review_requested(&mut self) {
        println!("喜欢 InstaFilter 吗？欢迎给我们评分！");
    }
}

fn open_store(cli: &Cli) -> Result<JsonFileStore, AppError> {
    match &cli.settings_dir {
        Some(dir) => JsonFileStore::in_dir(dir),
        None => JsonFileStore::default_location(),
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig, AppError> {
    match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e))),
        None => Ok(PipelineConfig::default()),
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli)?;

    match &cli.command {
        Command::List => {
            for kind in FilterKind::ALL {
                let keys: Vec<&str> = kind.accepted_keys().iter().map(|k| k.as_str()).collect();
                println!("{:<14} {:<14} [{}]", kind.as_str(), kind.display_name(), keys.join(", "));
            }
            Ok(())
        }
        Command::Usage => {
            let store = open_store(&cli)?;
            let count = store.get_i64(&config.usage_counter_key)?.unwrap_or(0);
            println!("{} / {}", count, config.review_threshold);
            Ok(())
        }
        Command::Apply {
            input,
            output,
            filter,
            intensity,
            radius,
            scale,
        } => {
            let store = open_store(&cli)?;
            let service = FilterService::with_store(config, Box::new(store))?;
            service.subscribe(Box::new(ConsoleObserver))?;

            let bound = service
                .open(ImageSource::FilePath(input.to_string_lossy().into_owned()))
                .await?;
            if bound.is_none() {
                log::warn!("初始渲染未产出图像，继续应用参数");
            }

            if let Some(name) = filter {
                let kind = FilterKind::from_str(name).map_err(|e| AppError::Config(e.to_string()))?;
                service.select_filter(kind)?;
            }

            let requested = [
                (ParameterKey::Intensity, *intensity),
                (ParameterKey::Radius, *radius),
                (ParameterKey::Scale, *scale),
            ];
            let kind = service.current_filter()?;
            for (key, value) in requested {
                let Some(value) = value else { continue };
                let clamped = key.clamp(value);
                if clamped != value {
                    log::warn!("{} 超出范围，已调整为 {}", key, clamped);
                }
                if !kind.accepts(key) {
                    log::info!("{} 不使用参数 {}，该值不会生效", kind, key);
                }
                service.adjust(key, clamped)?;
            }

            service.export(output)?;
            println!("{} -> {} ({})", input.display(), output.display(), kind.display_name());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("错误: {err}");
            ExitCode::FAILURE
        }
    }
}
