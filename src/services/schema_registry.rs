//! 参数模式注册表 - 业务能力层
//!
//! 纯查表：给定 (类别, 操作种类) 返回有序的参数定义。未知种类返回空序列，
//! 由调用方显示“无参数”占位文本。单操作表单与批处理任务共用同一份默认值，
//! 缺失的输入一律回落到这里的默认值。

use phf::phf_map;
use tracing::warn;

use crate::models::{OperationDomain, ParamValue, ParameterDef, ParameterMap};

static FEATURE_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "fast_corners" => "FAST 角点",
    "hog" => "HOG",
    "log_dog_blob" => "LoG/DoG 斑点",
    "orb" => "ORB",
    "sift" => "SIFT",
};

static FILTER_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "gaussian_blur" => "高斯模糊",
    "median_blur" => "中值模糊",
    "bilateral_filter" => "双边滤波",
    "canny" => "Canny 边缘",
    "gamma_correction" => "伽马校正",
    "threshold" => "阈值化",
    "sobel" => "Sobel",
    "laplacian" => "拉普拉斯",
};

static TRANSFORM_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "translation" => "平移",
    "rotation" => "旋转",
    "scaling" => "缩放",
    "flip" => "翻转",
    "crop" => "裁剪",
    "resize" => "调整尺寸",
    "color_adjustment" => "颜色调整",
};

const FEATURE_KINDS: &[&str] = &["fast_corners", "hog", "log_dog_blob", "orb", "sift"];
const FILTER_KINDS: &[&str] = &[
    "gaussian_blur",
    "median_blur",
    "bilateral_filter",
    "canny",
    "gamma_correction",
    "threshold",
    "sobel",
    "laplacian",
];
const TRANSFORM_KINDS: &[&str] = &[
    "translation",
    "rotation",
    "scaling",
    "flip",
    "crop",
    "resize",
    "color_adjustment",
];

/// 参数模式注册表（无状态）
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterSchemaRegistry;

impl ParameterSchemaRegistry {
    pub fn new() -> Self {
        Self
    }

    /// 某类别下可选的全部操作种类
    pub fn known_kinds(&self, domain: OperationDomain) -> &'static [&'static str] {
        match domain {
            OperationDomain::Feature => FEATURE_KINDS,
            OperationDomain::Filter => FILTER_KINDS,
            OperationDomain::Transform => TRANSFORM_KINDS,
        }
    }

    /// 操作种类的显示名称，未登记的原样返回
    pub fn display_name<'a>(&self, domain: OperationDomain, kind: &'a str) -> &'a str {
        let names = match domain {
            OperationDomain::Feature => &FEATURE_NAMES,
            OperationDomain::Filter => &FILTER_NAMES,
            OperationDomain::Transform => &TRANSFORM_NAMES,
        };
        names.get(kind).copied().unwrap_or(kind)
    }

    /// 参数模式
    pub fn schema_for(&self, domain: OperationDomain, kind: &str) -> Vec<ParameterDef> {
        match domain {
            OperationDomain::Feature => feature_schema(kind),
            OperationDomain::Filter => filter_schema(kind),
            OperationDomain::Transform => transform_schema(kind),
        }
    }

    /// 由参数模式得到的默认参数
    pub fn defaults_for(&self, domain: OperationDomain, kind: &str) -> ParameterMap {
        self.schema_for(domain, kind)
            .into_iter()
            .map(|def| (def.name.to_string(), def.default))
            .collect()
    }

    /// 将用户输入合并到默认值上
    ///
    /// 模式中的每个参数都会得到一个值：缺失或种类不符时取默认值；
    /// 模式之外的键被丢弃
    pub fn resolve(
        &self,
        domain: OperationDomain,
        kind: &str,
        overrides: &ParameterMap,
    ) -> ParameterMap {
        self.schema_for(domain, kind)
            .into_iter()
            .map(|def| {
                let value = match overrides.get(def.name) {
                    Some(value) if def.accepts(value) => value.clone(),
                    Some(value) => {
                        warn!(
                            "参数 {}.{} 的值 {} 不符合定义，使用默认值 {}",
                            kind, def.name, value, def.default
                        );
                        def.default.clone()
                    }
                    None => def.default.clone(),
                };
                (def.name.to_string(), value)
            })
            .collect()
    }
}

fn feature_schema(kind: &str) -> Vec<ParameterDef> {
    match kind {
        "fast_corners" => vec![
            ParameterDef::int("threshold", 10, 1, 50),
            ParameterDef::boolean("nonmax_suppression", true),
        ],
        "hog" => vec![
            ParameterDef::int("nbins", 9, 6, 18),
            ParameterDef::float("win_sigma", 4.0, 1.0, 10.0, 0.1),
        ],
        "log_dog_blob" => vec![
            ParameterDef::float("min_threshold", 10.0, 1.0, 50.0, 1.0),
            ParameterDef::float("max_threshold", 200.0, 100.0, 300.0, 1.0),
            ParameterDef::float("min_area", 100.0, 50.0, 500.0, 1.0),
        ],
        "orb" => vec![
            ParameterDef::int("n_features", 500, 100, 2000),
            ParameterDef::float("scale_factor", 1.2, 1.1, 2.0, 0.1),
        ],
        "sift" => vec![
            ParameterDef::int("n_features", 0, 0, 2000),
            ParameterDef::float("contrast_threshold", 0.04, 0.01, 0.1, 0.01),
        ],
        _ => Vec::new(),
    }
}

fn filter_schema(kind: &str) -> Vec<ParameterDef> {
    let odd_kernels = |sizes: &[i64]| -> Vec<ParamValue> {
        sizes.iter().map(|s| ParamValue::Int(*s)).collect()
    };

    match kind {
        "gaussian_blur" => vec![
            ParameterDef::choice("ksize", ParamValue::Int(5), odd_kernels(&[3, 5, 7, 9, 11])),
            ParameterDef::float("sigma", 0.0, 0.0, 5.0, 0.1),
        ],
        "median_blur" => vec![ParameterDef::choice(
            "ksize",
            ParamValue::Int(5),
            odd_kernels(&[3, 5, 7, 9]),
        )],
        "bilateral_filter" => vec![
            ParameterDef::int("d", 9, 5, 15),
            ParameterDef::float("sigma_color", 75.0, 25.0, 150.0, 1.0),
            ParameterDef::float("sigma_space", 75.0, 25.0, 150.0, 1.0),
        ],
        "canny" => vec![
            ParameterDef::float("threshold1", 100.0, 50.0, 200.0, 1.0),
            ParameterDef::float("threshold2", 200.0, 150.0, 300.0, 1.0),
        ],
        "gamma_correction" => vec![ParameterDef::float("gamma", 1.0, 0.1, 3.0, 0.1)],
        "threshold" => vec![
            ParameterDef::float("thresh", 127.0, 0.0, 255.0, 1.0),
            ParameterDef::float("maxval", 255.0, 0.0, 255.0, 1.0),
        ],
        _ => Vec::new(),
    }
}

fn transform_schema(kind: &str) -> Vec<ParameterDef> {
    match kind {
        "translation" => vec![
            ParameterDef::int("tx", 0, -200, 200),
            ParameterDef::int("ty", 0, -200, 200),
        ],
        "rotation" => vec![
            ParameterDef::float("angle", 0.0, -180.0, 180.0, 1.0),
            ParameterDef::float("scale", 1.0, 0.1, 2.0, 0.1),
        ],
        "scaling" => vec![
            ParameterDef::float("fx", 1.0, 0.1, 3.0, 0.1),
            ParameterDef::float("fy", 1.0, 0.1, 3.0, 0.1),
        ],
        "flip" => vec![ParameterDef::choice(
            "flip_code",
            ParamValue::Int(1),
            vec![ParamValue::Int(1), ParamValue::Int(0), ParamValue::Int(-1)],
        )],
        "resize" => vec![
            ParameterDef::int("width", 800, 50, 2000),
            ParameterDef::int("height", 600, 50, 2000),
        ],
        "color_adjustment" => vec![
            ParameterDef::choice(
                "channel",
                ParamValue::from("ALL"),
                ["ALL", "RED", "GREEN", "BLUE"]
                    .into_iter()
                    .map(ParamValue::from)
                    .collect(),
            ),
            ParameterDef::int("value", 0, -100, 100),
        ],
        _ => Vec::new(),
    }
}
