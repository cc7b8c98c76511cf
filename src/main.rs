//! 命令行入口
//!
//! 读取一个 HTML 文件，模拟从顶部滚动到底部，每个视口停留到翻译完成，
//! 最后输出插入了译文的文档。

use std::fs;
use std::io::{self, Read, Write};
use std::process;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use inline_translator::env::{EnvVar, LogLevel, NoColor};
use inline_translator::parsers::html::{html_to_dom, serialize_document};
use inline_translator::translation::{
    ConfigManager, Extension, FlowLayout, LayoutSource, Message, SettingsPatch, TranslationError,
    TranslationResult, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "inline-translator", version, about = "在英文网页中逐段插入中文译文")]
struct Cli {
    /// 输入 HTML 文件，`-` 表示标准输入
    input: String,

    /// 输出文件，缺省写到标准输出
    #[arg(short, long)]
    output: Option<String>,

    /// 配置文件
    #[arg(short, long)]
    config: Option<String>,

    /// 文档编码，缺省自动识别
    #[arg(short, long, default_value = "")]
    encoding: String,

    /// 视口宽度
    #[arg(long, default_value_t = 1280.0, value_parser = parse_dimension)]
    viewport_width: f64,

    /// 视口高度
    #[arg(long, default_value_t = 900.0, value_parser = parse_dimension)]
    viewport_height: f64,

    /// 每个视口最多等待的秒数
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// 覆盖最小文本长度
    #[arg(long)]
    min_text_length: Option<usize>,

    /// 覆盖翻译模型
    #[arg(long)]
    model: Option<String>,

    /// 不使用备用翻译接口
    #[arg(long)]
    no_fallback: bool,

    /// 结束时在标准错误输出统计信息
    #[arg(long)]
    stats: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

/// 视口尺寸必须是正的有限数
fn parse_dimension(value: &str) -> Result<f64, String> {
    let size: f64 = value
        .parse()
        .map_err(|_| format!("`{}` 不是有效的数字", value))?;
    if !size.is_finite() || size <= 0.0 {
        return Err(format!("视口尺寸必须大于0: {}", value));
    }
    Ok(size)
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        LogLevel::get()
            .ok()
            .and_then(|level| tracing::Level::from_str(&level).ok())
            .unwrap_or(tracing::Level::INFO)
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_ansi(!NoColor::get_or_default(false))
        .init();
}

fn read_input(input: &str) -> io::Result<Vec<u8>> {
    if input == "-" {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        Ok(data)
    } else {
        fs::read(input)
    }
}

fn write_output(output: Option<&str>, data: &[u8]) -> io::Result<()> {
    match output {
        Some(path) => fs::write(path, data),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()
        }
    }
}

async fn translate_document(cli: &Cli, data: &[u8]) -> TranslationResult<Vec<u8>> {
    let manager = ConfigManager::load(cli.config.as_deref())?;
    let mut config = manager.config().clone();
    if cli.no_fallback {
        config.gateway.fallback_url.clear();
    }

    let dom = html_to_dom(data, &cli.encoding);
    let layout = FlowLayout::new(cli.viewport_width, 24.0, (cli.viewport_width / 12.0) as usize);
    let extension =
        Extension::from_config(dom.document.clone(), &config, Box::new(layout.clone()))?;

    if cli.min_text_length.is_some() || cli.model.is_some() {
        let patch = SettingsPatch {
            min_text_length: cli.min_text_length,
            translation_model: cli.model.clone(),
            ..Default::default()
        };
        extension
            .dispatch(Message::UpdateSettings { settings: patch })
            .await;
    }

    extension.start();

    let session = extension.session();
    let wait = Duration::from_secs(cli.timeout);
    let mut measure = layout;
    let mut scroll_y = 0.0;

    loop {
        session.on_viewport_change(Viewport::new(
            scroll_y,
            cli.viewport_width,
            cli.viewport_height,
        ));
        if !session.wait_idle(wait).await {
            warn!("视口 {} 处的翻译未在 {} 秒内完成", scroll_y, cli.timeout);
        }

        // 插入译文后页面会变高
        measure.refresh(&dom.document);
        if scroll_y + cli.viewport_height >= measure.content_height() {
            break;
        }
        scroll_y += cli.viewport_height;
    }

    let stats = session.stats();
    info!(
        "翻译完成: 插入 {} 条译文，批次 {} 成功 / {} 失败",
        stats.batches.units_translated, stats.batches.succeeded, stats.batches.failed
    );
    if cli.stats {
        eprintln!("{:#?}", stats);
    }

    serialize_document(&dom.document, &cli.encoding).map_err(TranslationError::from)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data = match read_input(&cli.input) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: 无法读取 {}: {}", cli.input, e);
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: 无法创建运行时: {}", e);
            process::exit(1);
        }
    };

    let local = tokio::task::LocalSet::new();
    let result = local.block_on(&runtime, translate_document(&cli, &data));

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_output(cli.output.as_deref(), &output) {
        eprintln!("Error: 无法写出结果: {}", e);
        process::exit(1);
    }
}
