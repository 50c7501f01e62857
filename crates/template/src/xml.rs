use serde::Deserialize;
use tracing::warn;

use crate::error::TemplateError;
use crate::frame::{Frame, FrameShape, Layout};
use crate::paper::{find_paper, PAPER_ID_OTHER};
use crate::template::Template;
use crate::units::parse_length;

#[derive(Debug, Deserialize)]
struct TemplatesXml {
    #[serde(rename = "Template", default)]
    templates: Vec<TemplateXml>,
}

#[derive(Debug, Deserialize)]
struct TemplateXml {
    #[serde(rename = "@brand", default)]
    brand: Option<String>,
    #[serde(rename = "@part", default)]
    part: Option<String>,
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "@equiv", default)]
    equiv: Option<String>,
    #[serde(rename = "@description", default)]
    description: Option<String>,
    #[serde(rename = "@_description", default)]
    i18n_description: Option<String>,
    #[serde(rename = "@size", default)]
    size: Option<String>,
    #[serde(rename = "@width", default)]
    width: Option<String>,
    #[serde(rename = "@height", default)]
    height: Option<String>,
    #[serde(rename = "Label-rectangle", default)]
    rectangles: Vec<FrameXml>,
    #[serde(rename = "Label-round", default)]
    rounds: Vec<FrameXml>,
    #[serde(rename = "Label-ellipse", default)]
    ellipses: Vec<FrameXml>,
    #[serde(rename = "Label-cd", default)]
    cds: Vec<FrameXml>,
}

#[derive(Debug, Deserialize)]
struct FrameXml {
    #[serde(rename = "@id", default)]
    id: Option<String>,
    #[serde(rename = "@width", default)]
    width: Option<String>,
    #[serde(rename = "@height", default)]
    height: Option<String>,
    #[serde(rename = "@round", default)]
    round: Option<String>,
    #[serde(rename = "@radius", default)]
    radius: Option<String>,
    #[serde(rename = "@hole", default)]
    hole: Option<String>,
    #[serde(rename = "@waste", default)]
    waste: Option<String>,
    #[serde(rename = "@x_waste", default)]
    x_waste: Option<String>,
    #[serde(rename = "@y_waste", default)]
    y_waste: Option<String>,
    #[serde(rename = "Layout", default)]
    layouts: Vec<LayoutXml>,
}

#[derive(Debug, Deserialize)]
struct LayoutXml {
    #[serde(rename = "@nx", default)]
    nx: Option<String>,
    #[serde(rename = "@ny", default)]
    ny: Option<String>,
    #[serde(rename = "@x0", default)]
    x0: Option<String>,
    #[serde(rename = "@y0", default)]
    y0: Option<String>,
    #[serde(rename = "@dx", default)]
    dx: Option<String>,
    #[serde(rename = "@dy", default)]
    dy: Option<String>,
}

fn length(value: &Option<String>) -> Result<f64, TemplateError> {
    match value {
        Some(value) => parse_length(value),
        None => Ok(0.0),
    }
}

fn count(attribute: &'static str, value: &Option<String>) -> Result<u32, TemplateError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| TemplateError::InvalidAttribute {
                attribute,
                value: value.clone(),
            }),
        None => Ok(1),
    }
}

fn layouts(frame: &FrameXml) -> Result<Vec<Layout>, TemplateError> {
    frame
        .layouts
        .iter()
        .map(|layout| {
            Ok(Layout {
                nx: count("nx", &layout.nx)?,
                ny: count("ny", &layout.ny)?,
                x0: length(&layout.x0)?,
                y0: length(&layout.y0)?,
                dx: length(&layout.dx)?,
                dy: length(&layout.dy)?,
            })
        })
        .collect()
}

fn frame(xml: &FrameXml, shape: FrameShape) -> Result<Frame, TemplateError> {
    Ok(Frame {
        id: xml.id.clone().unwrap_or_else(|| "0".to_string()),
        shape,
        layouts: layouts(xml)?,
    })
}

fn frames(template: &TemplateXml) -> Result<Vec<Frame>, TemplateError> {
    let mut frames = Vec::new();
    for xml in &template.rectangles {
        // A single "waste" attribute applies to both axes.
        let (x_waste, y_waste) = match &xml.waste {
            Some(_) => {
                let waste = length(&xml.waste)?;
                (waste, waste)
            }
            None => (length(&xml.x_waste)?, length(&xml.y_waste)?),
        };
        let shape = FrameShape::Rect {
            width: length(&xml.width)?,
            height: length(&xml.height)?,
            round: length(&xml.round)?,
            x_waste,
            y_waste,
        };
        frames.push(frame(xml, shape)?);
    }
    for xml in &template.rounds {
        let shape = FrameShape::Round {
            radius: length(&xml.radius)?,
            waste: length(&xml.waste)?,
        };
        frames.push(frame(xml, shape)?);
    }
    for xml in &template.ellipses {
        let shape = FrameShape::Ellipse {
            width: length(&xml.width)?,
            height: length(&xml.height)?,
            waste: length(&xml.waste)?,
        };
        frames.push(frame(xml, shape)?);
    }
    for xml in &template.cds {
        let shape = FrameShape::Cd {
            radius: length(&xml.radius)?,
            hole: length(&xml.hole)?,
            width: length(&xml.width)?,
            height: length(&xml.height)?,
            waste: length(&xml.waste)?,
        };
        frames.push(frame(xml, shape)?);
    }
    Ok(frames)
}

fn brand_and_part(xml: &TemplateXml) -> Result<(String, String), TemplateError> {
    if let (Some(brand), Some(part)) = (&xml.brand, &xml.part) {
        return Ok((brand.clone(), part.clone()));
    }
    let name = xml.name.as_deref().ok_or(TemplateError::MissingName)?;
    let (brand, part) = name.split_once(' ').unwrap_or((name, ""));
    Ok((brand.to_string(), part.trim_start().to_string()))
}

fn page_size(xml: &TemplateXml, name: &str) -> Result<(String, f64, f64), TemplateError> {
    let size = xml.size.as_deref().unwrap_or(PAPER_ID_OTHER);
    if size == PAPER_ID_OTHER {
        return match (&xml.width, &xml.height) {
            (Some(width), Some(height)) => Ok((
                PAPER_ID_OTHER.to_string(),
                parse_length(width)?,
                parse_length(height)?,
            )),
            _ => Err(TemplateError::MissingPageSize(name.to_string())),
        };
    }
    match find_paper(size) {
        Some(paper) => Ok((paper.id.to_string(), paper.width, paper.height)),
        None => {
            warn!(template = name, paper = size, "unknown paper size, using US-Letter");
            Ok((size.to_string(), 612.0, 792.0))
        }
    }
}

/// Parses a template database document. `known` resolves `equiv` references
/// to templates loaded earlier.
pub(crate) fn parse_templates(
    xml: &str,
    known: &[Template],
) -> Result<Vec<Template>, TemplateError> {
    let document: TemplatesXml = quick_xml::de::from_str(xml)?;
    let mut parsed: Vec<Template> = Vec::with_capacity(document.templates.len());

    for entry in document.templates {
        let (brand, part) = brand_and_part(&entry)?;
        let name = format!("{brand} {part}");

        let mut template = if let Some(equiv) = &entry.equiv {
            let base = parsed
                .iter()
                .chain(known.iter())
                .find(|candidate| candidate.brand == brand && candidate.part == *equiv)
                .ok_or_else(|| TemplateError::UnknownEquivalent {
                    name: name.clone(),
                    equiv: equiv.clone(),
                })?;
            Template {
                brand: brand.clone(),
                part: part.clone(),
                ..base.clone()
            }
        } else {
            let (paper_id, page_width, page_height) = page_size(&entry, &name)?;
            Template {
                brand: brand.clone(),
                part: part.clone(),
                description: String::new(),
                paper_id,
                page_width,
                page_height,
                frames: frames(&entry)?,
            }
        };

        if let Some(description) = entry.description.or(entry.i18n_description) {
            template.description = description;
        }
        if template.frames.is_empty() {
            return Err(TemplateError::NoFrame(name));
        }
        parsed.push(template);
    }

    Ok(parsed)
}
