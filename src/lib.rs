//! # 证件篡改检测工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 命令行 (main.rs, clap)                    │
//! │   上传图路径 + 目录覆盖参数 ── settings (JSON 配置)        │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            库 (Rust)                             │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ comparison ─ 归一化 → SSIM → 差异区域 → 标注          │
//! │  │   ├─ handler     阶段编排 + 耗时日志                   │
//! │  │   └─ decoder     有序解码策略链                        │
//! │  │                                                       │
//! │  ├─ storage ──── 参考图定位 / 产物落盘 (DirectorySink)     │
//! │  └─ settings ─── CompareConfig 读写                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，命令行入口的返回类型 |
//! | [`comparison`] | 两张证件图的归一化、SSIM 比对、差异区域提取与标注 |
//! | [`storage`] | 按优先级定位参考图，按固定文件名写出比对产物 |
//! | [`settings`] | 从 JSON 文件加载/保存 `CompareConfig` |

pub mod error;
pub mod comparison;
pub mod storage;
pub mod settings;
