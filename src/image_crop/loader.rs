//! # 加载与解码模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（文件 / 内存字节 / Base64）的原始字节加载，并在“尽可能早”的阶段执行输入校验。
//! 解码前先读取图片头尺寸做像素与内存上限检查，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - 字节：体积限制。
//! - Base64：格式解析 + 预估解码体积限制。
//! - 三者均通过 magic bytes 校验是否为图片，再在阻塞线程池中完成解码。

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;

use super::source::{ImageSource, RawImageData, SourceInput};
use super::{CropConfig, CropError, CropHandler};

impl CropHandler {
    /// 加载并解码图片，显示尺寸默认等于原始尺寸。
    ///
    /// 这是流水线的第一个挂起点：解码在 `spawn_blocking` 中执行。
    pub async fn load_source(&self, input: SourceInput) -> Result<ImageSource, CropError> {
        let config = self.config_snapshot()?;
        let raw = Self::load_raw(input, &config)?;

        let image = tokio::task::spawn_blocking(move || Self::decode_with_limits(raw, &config))
            .await
            .map_err(|e| CropError::Decode(format!("解码线程执行失败：{}", e)))??;

        ImageSource::at_natural_size(image)
    }

    pub(super) fn load_raw(input: SourceInput, config: &CropConfig) -> Result<RawImageData, CropError> {
        match input {
            SourceInput::FilePath(path) => Self::load_from_file(&path, config),
            SourceInput::Bytes(bytes) => Self::load_from_bytes(bytes, config),
            SourceInput::Base64(data) => Self::load_from_base64(&data, config),
        }
    }

    fn load_from_file(path: &str, config: &CropConfig) -> Result<RawImageData, CropError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path);

        let file_path = Path::new(path);
        if !file_path.exists() {
            return Err(CropError::FileSystem(format!("文件不存在：{}", path)));
        }

        let metadata = std::fs::metadata(file_path)
            .map_err(|e| CropError::FileSystem(format!("无法读取文件信息：{}", e)))?;
        Self::validate_file_size(metadata.len(), config)?;

        let bytes = std::fs::read(file_path)
            .map_err(|e| CropError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    fn load_from_bytes(bytes: Vec<u8>, config: &CropConfig) -> Result<RawImageData, CropError> {
        Self::validate_file_size(bytes.len() as u64, config)?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "bytes",
        })
    }

    fn load_from_base64(data: &str, config: &CropConfig) -> Result<RawImageData, CropError> {
        log::info!("📝 开始处理 base64 图片");

        let bytes = Self::parse_base64_with_limit(data, config.max_file_size)?;
        Self::validate_file_size(bytes.len() as u64, config)?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    fn validate_file_size(len: u64, config: &CropConfig) -> Result<(), CropError> {
        if len > config.max_file_size {
            return Err(CropError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                len as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Ok(())
    }

    /// 完整解码，前后各做一次像素与内存上限检查。
    pub(super) fn decode_with_limits(raw: RawImageData, config: &CropConfig) -> Result<DynamicImage, CropError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| CropError::Decode(format!("图片解码失败：{}", e)))?;
        Self::validate_pixel_limits(config, decoded.width(), decoded.height())?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
            raw.source_hint,
            decoded.width(),
            decoded.height()
        );

        Ok(decoded)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), CropError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CropError::Decode(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| CropError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    fn validate_pixel_limits(config: &CropConfig, width: u32, height: u32) -> Result<(), CropError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| CropError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(CropError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        let estimated = pixels
            .checked_mul(4)
            .ok_or_else(|| CropError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(CropError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, CropError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| CropError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| CropError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    /// 解析 Base64 输入（支持 Data URL / 纯 Base64），解码前按预估体积拒绝过大输入。
    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, CropError> {
        let normalized = data.trim();

        let payload = if normalized.starts_with("data:image/") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| CropError::InvalidFormat("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(payload)?;
        if estimated_len > max_file_size {
            return Err(CropError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| CropError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 通过文件签名（magic bytes）校验输入是否为图片。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), CropError> {
        if bytes.is_empty() {
            return Err(CropError::InvalidFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| CropError::InvalidFormat("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(CropError::InvalidFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use image::{ImageBuffer, ImageFormat, Rgba};

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[tokio::test]
    async fn loads_png_bytes_at_natural_size() {
        let handler = CropHandler::new(CropConfig::default());
        let source = handler
            .load_source(SourceInput::Bytes(create_png_bytes(64, 32)))
            .await
            .expect("png should load");

        assert_eq!(source.natural_width(), 64);
        assert_eq!(source.natural_height(), 32);
        assert_eq!(source.scale_x(), 1.0);
    }

    #[tokio::test]
    async fn loads_data_url() {
        let handler = CropHandler::new(CropConfig::default());
        let data_url = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(create_png_bytes(16, 16))
        );

        let source = handler
            .load_source(SourceInput::Base64(data_url))
            .await
            .expect("data url should load");

        assert_eq!(source.natural_width(), 16);
    }

    #[tokio::test]
    async fn missing_file_is_file_system_error() {
        let handler = CropHandler::new(CropConfig::default());
        let result = handler
            .load_source(SourceInput::FilePath("/definitely/not/here.png".into()))
            .await;

        assert!(matches!(result, Err(CropError::FileSystem(_))));
    }

    #[test]
    fn base64_non_image_payload_is_rejected() {
        let result = CropHandler::load_raw(SourceInput::Base64("SGVsbG8=".into()), &CropConfig::default());

        assert!(matches!(result, Err(CropError::InvalidFormat(_))));
    }

    #[test]
    fn parse_base64_with_limit_rejects_large_payload_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = CropHandler::parse_base64_with_limit(&huge, 32);

        assert!(matches!(result, Err(CropError::ResourceLimit(_))));
    }

    #[test]
    fn truncated_png_is_decode_failure() {
        let mut png = create_png_bytes(32, 32);
        png.truncate(png.len() / 2);
        let raw = CropHandler::load_raw(SourceInput::Bytes(png), &CropConfig::default())
            .expect("signature is still png");

        let result = CropHandler::decode_with_limits(raw, &CropConfig::default());

        assert!(matches!(result, Err(CropError::Decode(_))));
    }

    #[test]
    fn rejects_too_many_pixels_before_decode() {
        let config = CropConfig {
            max_decoded_pixels: 1_000,
            ..CropConfig::default()
        };
        let raw = CropHandler::load_raw(SourceInput::Bytes(create_png_bytes(100, 100)), &config)
            .expect("load should succeed");

        let result = CropHandler::decode_with_limits(raw, &config);

        assert!(matches!(result, Err(CropError::ResourceLimit(_))));
    }

    #[test]
    fn oversize_bytes_are_rejected() {
        let config = CropConfig {
            max_file_size: 8,
            ..CropConfig::default()
        };

        let result = CropHandler::load_raw(SourceInput::Bytes(create_png_bytes(8, 8)), &config);

        assert!(matches!(result, Err(CropError::ResourceLimit(_))));
    }
}
