//! # 图片比对模块（comparison）
//!
//! ## 设计思路
//!
//! 该模块将“格式校验 → 加载 → 解码归一化 → SSIM 比对 → 差异区域提取 → 标注”
//! 按职责拆分为多个子模块，每个阶段只向后传递不可变数据。
//!
//! - `handler`：编排整条处理流水线并记录阶段耗时
//! - `loader`：负责文件/字节加载与体积校验
//! - `format`：扩展名白名单
//! - `decoder`：有序的解码策略链
//! - `normalizer`：解码、透明通道合成、Lanczos 缩放到 250×160
//! - `similarity`：灰度化与 SSIM，输出得分与差异图
//! - `regions`：Otsu 反相二值化与外轮廓矩形
//! - `annotate`：红框标注、结论文案与拼接图
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 实现思路
//!
//! 对外暴露编排器与数据模型；纯计算步骤（`similarity/regions/annotate`）
//! 同样公开，便于单独复用。目录布局与产物落盘不在本模块内，见 `crate::storage`。
//!
//! ## 新同事快速上手
//!
//! ```text
//! ImageSource（参考图 + 上传图）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（扩展名白名单 + 体积校验）
//!    ├─ normalizer.rs（decoder 策略链 + 透明合成 + 缩放）
//!    ├─ similarity.rs（灰度 + SSIM + 差异图）
//!    ├─ regions.rs（Otsu + 外轮廓矩形）
//!    └─ annotate.rs（红框 + "NN.NN% correct"）
//!    ↓
//! ResultSink（交付产物）
//! ```

pub mod annotate;
mod config;
mod decoder;
mod error;
mod format;
mod handler;
mod loader;
mod normalizer;
pub mod regions;
pub mod similarity;
mod source;

pub use config::CompareConfig;
pub use decoder::{
    DecodeStrategy,
    DecoderChain,
    DeclaredFormatDecoder,
    GuessedFormatDecoder,
    SniffedFormatDecoder,
};
pub use error::CompareError;
pub use format::{ImageExtension, SUPPORTED_EXTENSIONS};
pub use handler::{ComparisonHandler, PipelineStage, ResultSink};
pub use source::{
    ComparisonReport,
    GrayscaleMap,
    ImageRole,
    ImageSource,
    NORMALIZED_HEIGHT,
    NORMALIZED_WIDTH,
    NormalizedImage,
    RawImage,
    Region,
    RegionExtraction,
    RegionSet,
    SimilarityResult,
};
