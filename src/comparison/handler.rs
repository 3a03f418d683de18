//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ComparisonHandler` 只负责流程编排与配置持有，不直接接触目录布局。
//! 处理链路固定为单向状态机：
//!
//! ```text
//! Received → Normalized → Compared → Regioned → Annotated → Delivered
//! ```
//!
//! 任一阶段失败即终止本次请求，不重试、不回退，也不产出部分结果。
//!
//! ## 实现思路
//!
//! - 配置在构造时校验一次，之后只读。
//! - 参考图与上传图走同一条加载/归一化路径，保证处理一致。
//! - 记录 `load/normalize/compare/regions/annotate/total` 阶段耗时，便于诊断。

use std::fmt;
use std::time::Instant;

use super::decoder::DecoderChain;
use super::source::{ComparisonReport, ImageRole, ImageSource};
use super::{CompareConfig, CompareError, annotate, regions, similarity};

/// 比对请求所处阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Normalized,
    Compared,
    Regioned,
    Annotated,
    Delivered,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Normalized => "normalized",
            Self::Compared => "compared",
            Self::Regioned => "regioned",
            Self::Annotated => "annotated",
            Self::Delivered => "delivered",
        };
        f.write_str(name)
    }
}

/// 结果接收方：接收一次比对的完整产物。
pub trait ResultSink {
    /// 交付成功后的回执（如写出的文件路径）。
    type Receipt;

    /// 交付产物；失败时不得留下部分产物。
    fn deliver(&mut self, report: &ComparisonReport) -> Result<Self::Receipt, CompareError>;
}

/// 比对处理器。
///
/// 持有只读配置与解码策略链，编排各子模块实现完整流程。
pub struct ComparisonHandler {
    pub(super) config: CompareConfig,
    pub(super) decoders: DecoderChain,
}

impl ComparisonHandler {
    /// 根据配置创建处理器，使用默认解码策略链。
    ///
    /// # 示例
    /// ```rust
    /// use doc_tamper::comparison::{CompareConfig, ComparisonHandler};
    ///
    /// let handler = ComparisonHandler::new(CompareConfig::default())?;
    /// assert_eq!(handler.config().artifact_quality, 95);
    /// # Ok::<(), doc_tamper::comparison::CompareError>(())
    /// ```
    pub fn new(config: CompareConfig) -> Result<Self, CompareError> {
        Self::with_decoders(config, DecoderChain::default())
    }

    /// 使用自定义解码策略链创建处理器。
    pub fn with_decoders(config: CompareConfig, decoders: DecoderChain) -> Result<Self, CompareError> {
        config.validate()?;
        Ok(Self { config, decoders })
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// 处理主入口：加载两张图片并完成比对，不做任何输出。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use doc_tamper::comparison::{CompareConfig, ComparisonHandler, ImageSource};
    ///
    /// let handler = ComparisonHandler::new(CompareConfig::default())?;
    /// let report = handler.compare(
    ///     ImageSource::FilePath("app/static/original/image.jpg".into()),
    ///     ImageSource::FilePath("uploads/card.png".into()),
    /// )?;
    /// println!("{}", report.label());
    /// # Ok::<(), doc_tamper::comparison::CompareError>(())
    /// ```
    pub fn compare(
        &self,
        reference: ImageSource,
        candidate: ImageSource,
    ) -> Result<ComparisonReport, CompareError> {
        let total_start = Instant::now();
        log::debug!("📥 比对请求进入阶段：{}", PipelineStage::Received);

        let load_start = Instant::now();
        let reference_raw = self
            .load(reference, ImageRole::Reference)
            .inspect_err(|e| Self::log_abort(PipelineStage::Received, e))?;
        let candidate_raw = self
            .load(candidate, ImageRole::Candidate)
            .inspect_err(|e| Self::log_abort(PipelineStage::Received, e))?;
        let load_elapsed = load_start.elapsed();

        let normalize_start = Instant::now();
        let reference_image = self
            .normalize(&reference_raw)
            .inspect_err(|e| Self::log_abort(PipelineStage::Received, e))?;
        let candidate_image = self
            .normalize(&candidate_raw)
            .inspect_err(|e| Self::log_abort(PipelineStage::Received, e))?;
        let normalize_elapsed = normalize_start.elapsed();
        log::debug!("➡️ 比对请求进入阶段：{}", PipelineStage::Normalized);

        let compare_start = Instant::now();
        let similarity = similarity::compare(&reference_image, &candidate_image)
            .inspect_err(|e| Self::log_abort(PipelineStage::Normalized, e))?;
        let compare_elapsed = compare_start.elapsed();
        log::debug!("➡️ 比对请求进入阶段：{}", PipelineStage::Compared);

        let regions_start = Instant::now();
        let extraction = regions::extract_regions(&similarity.difference);
        let regions_elapsed = regions_start.elapsed();
        log::debug!("➡️ 比对请求进入阶段：{}", PipelineStage::Regioned);

        let annotate_start = Instant::now();
        let annotated_reference = annotate::annotate(reference_image.pixels(), &extraction.regions);
        let annotated_candidate = annotate::annotate(candidate_image.pixels(), &extraction.regions);
        let annotate_elapsed = annotate_start.elapsed();
        log::debug!("➡️ 比对请求进入阶段：{}", PipelineStage::Annotated);

        let report = ComparisonReport {
            similarity,
            extraction,
            annotated_reference,
            annotated_candidate,
            normalized_candidate: candidate_image.into_pixels(),
        };

        log::info!(
            "✅ 图片比对完成 - {} 区域数={} otsu={} load={}ms normalize={}ms compare={}ms regions={}ms annotate={}ms total={}ms",
            report.label(),
            report.regions().len(),
            report.extraction.level,
            load_elapsed.as_millis(),
            normalize_elapsed.as_millis(),
            compare_elapsed.as_millis(),
            regions_elapsed.as_millis(),
            annotate_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(report)
    }

    /// 比对并交付给结果接收方。
    pub fn compare_and_deliver<S: ResultSink>(
        &self,
        reference: ImageSource,
        candidate: ImageSource,
        sink: &mut S,
    ) -> Result<(ComparisonReport, S::Receipt), CompareError> {
        let report = self.compare(reference, candidate)?;

        let deliver_start = Instant::now();
        let receipt = sink
            .deliver(&report)
            .inspect_err(|e| Self::log_abort(PipelineStage::Annotated, e))?;
        log::info!(
            "📤 比对请求进入阶段：{}（deliver={}ms）",
            PipelineStage::Delivered,
            deliver_start.elapsed().as_millis()
        );

        Ok((report, receipt))
    }

    fn log_abort(stage: PipelineStage, error: &CompareError) {
        log::warn!("❌ 比对请求在阶段 {} 之后终止：{}", stage, error);
    }
}
