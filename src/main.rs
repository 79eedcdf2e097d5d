//! # fragment-client — 命令行入口
//!
//! 本文件仅负责参数解析、日志与设置初始化，业务逻辑详见 `lib.rs` 架构文档。

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fragment_client::api::{ApiClient, ImageKind};
use fragment_client::error::AppError;
use fragment_client::image_crop::{
    CropConfig, CropHandler, CropRegion, EncodeProfile, ResizeConstraint, SourceInput,
};
use fragment_client::settings::ClientSettings;
use fragment_client::uploader::{ProfileUploader, UploadRequest};
use fragment_client::wallet::{WalletAddress, WalletContext};

#[derive(Parser)]
#[command(name = "fragment-client", version, about = "Crop, resize and upload profile images")]
struct Cli {
    /// 设置文件路径
    #[arg(long, global = true, default_value = "fragment-client.json")]
    settings: PathBuf,

    /// 编码档位（quality / balanced / speed），覆盖设置文件中的值
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 裁剪并编码为 JPEG，写入本地文件
    Crop {
        #[command(flatten)]
        crop: CropArgs,
        #[arg(long)]
        max_width: u32,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// 裁剪后上传为头像或横幅
    Upload {
        #[arg(value_enum)]
        kind: KindArg,
        #[command(flatten)]
        crop: CropArgs,
        /// 不指定时使用设置文件中的宽度
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        wallet: String,
    },
}

#[derive(Args)]
struct CropArgs {
    #[arg(short, long)]
    input: PathBuf,
    #[arg(long)]
    x: f64,
    #[arg(long)]
    y: f64,
    #[arg(long)]
    width: f64,
    #[arg(long)]
    height: f64,
    /// 裁剪时的显示宽度，缺省为原始宽度
    #[arg(long)]
    display_width: Option<f64>,
    /// 裁剪时的显示高度，缺省为原始高度
    #[arg(long)]
    display_height: Option<f64>,
}

impl CropArgs {
    fn region(&self) -> CropRegion {
        CropRegion::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Avatar,
    Banner,
}

impl From<KindArg> for ImageKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Avatar => ImageKind::Avatar,
            KindArg::Banner => ImageKind::Banner,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        log::error!("执行失败: {err}");
        std::process::exit(1);
    }
}

/// 以设置文件中的档位创建裁剪器，命令行 `--profile` 优先。
fn build_cropper(settings: &ClientSettings, profile: Option<&str>) -> Result<CropHandler, AppError> {
    let cropper = CropHandler::new(CropConfig::with_profile(settings.encode_profile));
    if let Some(profile) = profile {
        cropper.set_profile(EncodeProfile::from_str(profile)?)?;
    }
    Ok(cropper)
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let settings = ClientSettings::load(&cli.settings)?;
    let cropper = build_cropper(&settings, cli.profile.as_deref())?;

    match cli.command {
        Command::Crop {
            crop,
            max_width,
            output,
        } => {
            let source = cropper
                .load_source(SourceInput::FilePath(crop.input.to_string_lossy().into_owned()))
                .await?;
            let display_width = crop.display_width.unwrap_or(source.natural_width() as f64);
            let display_height = crop.display_height.unwrap_or(source.natural_height() as f64);
            let source = source.with_display_size(display_width, display_height)?;

            let encoded = cropper
                .produce_cropped_image(&source, &crop.region(), ResizeConstraint::new(max_width)?)
                .await?;

            std::fs::write(&output, encoded.bytes())?;
            println!("{} {}x{} {} bytes", output.display(), encoded.width(), encoded.height(), encoded.len());
        }
        Command::Upload {
            kind,
            crop,
            max_width,
            wallet,
        } => {
            let kind = ImageKind::from(kind);
            let wallet = WalletContext::connected(WalletAddress::parse(&wallet)?);
            let file_bytes = std::fs::read(&crop.input)?;

            let (display_width, display_height) = match (crop.display_width, crop.display_height) {
                (Some(w), Some(h)) => (w, h),
                _ => {
                    let (w, h) = image::image_dimensions(&crop.input)
                        .map_err(|e| fragment_client::image_crop::CropError::Decode(e.to_string()))?;
                    (
                        crop.display_width.unwrap_or(w as f64),
                        crop.display_height.unwrap_or(h as f64),
                    )
                }
            };

            let uploader = ProfileUploader::new(cropper, ApiClient::new(&settings.api)?);
            let request = UploadRequest {
                kind,
                file_bytes,
                display_width,
                display_height,
                crop: crop.region(),
                max_width: Some(max_width.unwrap_or(settings.max_width_for(kind))),
            };

            let url = uploader.upload(&wallet, &request).await?;
            println!("{url}");
        }
    }

    Ok(())
}
