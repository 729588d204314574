//! 机器人描述文件解析
//!
//! 描述文件是 URDF 风格的 XML：
//!
//! ```xml
//! <robot name="demo">
//!   <link name="base"/>
//!   <link name="arm"/>
//!   <joint name="shoulder" type="revolute">
//!     <parent link="base"/>
//!     <child link="arm"/>
//!     <limit lower="-1.5" upper="1.5" effort="30" velocity="2"/>
//!     <safety_controller soft_lower_limit="-1.4" soft_upper_limit="1.4"
//!                        k_position="10" k_velocity="5"/>
//!   </joint>
//!   <transmission type="simple" name="shoulder_trans">
//!     <actuator name="shoulder_motor"/>
//!     <joint name="shoulder"/>
//!     <mechanicalReduction>50</mechanicalReduction>
//!   </transmission>
//! </robot>
//! ```
//!
//! 关节与连杆在这里解析为 [`KinematicModel`]；`<transmission>` 块不做解释，
//! 原样转换为拥有所有权的 [`Element`] 树，交给具体的传动机构自行解析。

use std::path::Path;
use tracing::debug;

use crate::error::DescriptionError;
use crate::joint::{Joint, JointLimits, JointType, KinematicModel, SafetyController};

/// 拥有所有权的 XML 元素
///
/// 只保留传动机构解析所需的信息：标签、属性（保持声明顺序）、文本和子元素。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// 按名称获取属性
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// 第一个指定标签的子元素
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// 全部指定标签的子元素（声明顺序）
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// 去除首尾空白后的文本
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let mut text = String::new();
        let mut children = Vec::new();
        for child in node.children() {
            if child.is_element() {
                children.push(Element::from_node(child));
            } else if let Some(t) = child.text().filter(|_| child.is_text()) {
                text.push_str(t);
            }
        }

        Self {
            tag: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            text: (!text.trim().is_empty()).then_some(text),
            children,
        }
    }
}

/// 原始的传动机构配置块
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionBlock {
    /// `<transmission>` 元素本身
    pub element: Element,
}

impl TransmissionBlock {
    /// 声明的类型（`type` 属性）
    pub fn type_name(&self) -> Option<&str> {
        self.element.attribute("type")
    }

    /// 声明的名称（`name` 属性）
    pub fn name(&self) -> Option<&str> {
        self.element.attribute("name")
    }
}

/// 解析后的机器人描述
#[derive(Debug, Clone, Default)]
pub struct Description {
    /// 运动学模型
    pub model: KinematicModel,
    /// 传动机构配置块（声明顺序）
    pub transmissions: Vec<TransmissionBlock>,
}

impl Description {
    /// 从文件加载
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, DescriptionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DescriptionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content)
    }

    /// 从 XML 字符串解析
    pub fn parse_str(xml: &str) -> Result<Self, DescriptionError> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();
        if !root.has_tag_name("robot") {
            return Err(DescriptionError::InvalidRoot(
                root.tag_name().name().to_string(),
            ));
        }

        let mut model = KinematicModel::new(root.attribute("name").unwrap_or_default());
        let mut transmissions = Vec::new();

        for child in root.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "link" => {
                    let name = required_attribute(child, "name")?;
                    model.add_link(name);
                },
                "joint" => model.add_joint(parse_joint(child)?)?,
                "transmission" => transmissions.push(TransmissionBlock {
                    element: Element::from_node(child),
                }),
                other => debug!("Ignoring robot description element <{}>", other),
            }
        }

        debug!(
            "Parsed robot description '{}': {} links, {} joints, {} transmissions",
            model.name(),
            model.links().len(),
            model.joints().len(),
            transmissions.len()
        );

        Ok(Self {
            model,
            transmissions,
        })
    }
}

fn parse_joint(node: roxmltree::Node<'_, '_>) -> Result<Joint, DescriptionError> {
    let name = required_attribute(node, "name")?;
    let type_str = required_attribute(node, "type")?;
    let joint_type =
        JointType::parse(type_str).ok_or_else(|| DescriptionError::UnknownJointType {
            joint: name.to_string(),
            joint_type: type_str.to_string(),
        })?;

    let mut joint = Joint::new(name, joint_type);
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "parent" => joint.parent_link = Some(required_attribute(child, "link")?.to_string()),
            "child" => joint.child_link = Some(required_attribute(child, "link")?.to_string()),
            "limit" => {
                joint.limits = Some(JointLimits {
                    lower: optional_number(child, "lower")?.unwrap_or(0.0),
                    upper: optional_number(child, "upper")?.unwrap_or(0.0),
                    effort: required_number(child, "effort")?,
                    velocity: required_number(child, "velocity")?,
                })
            },
            "safety_controller" => {
                joint.safety = Some(SafetyController {
                    soft_lower_limit: optional_number(child, "soft_lower_limit")?.unwrap_or(0.0),
                    soft_upper_limit: optional_number(child, "soft_upper_limit")?.unwrap_or(0.0),
                    k_position: optional_number(child, "k_position")?.unwrap_or(0.0),
                    k_velocity: required_number(child, "k_velocity")?,
                })
            },
            _ => {},
        }
    }

    Ok(joint)
}

fn required_attribute<'a>(
    node: roxmltree::Node<'a, '_>,
    attribute: &'static str,
) -> Result<&'a str, DescriptionError> {
    node.attribute(attribute)
        .ok_or_else(|| DescriptionError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute,
        })
}

fn optional_number(
    node: roxmltree::Node<'_, '_>,
    attribute: &'static str,
) -> Result<Option<f64>, DescriptionError> {
    node.attribute(attribute)
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| DescriptionError::InvalidNumber {
                    element: node.tag_name().name().to_string(),
                    attribute,
                    value: raw.to_string(),
                })
        })
        .transpose()
}

fn required_number(
    node: roxmltree::Node<'_, '_>,
    attribute: &'static str,
) -> Result<f64, DescriptionError> {
    optional_number(node, attribute)?.ok_or_else(|| DescriptionError::MissingAttribute {
        element: node.tag_name().name().to_string(),
        attribute,
    })
}
