//! Instruction tree and the tag registry that builds it.
//!
//! Every element of a document section decodes into one [`Instruction`].
//! The [`Registry`] maps an element tag to a constructor; it is consulted
//! only while loading.

use std::collections::{BTreeMap, HashMap};

use crate::classes::ClassTable;
use crate::error::{ForgeError, Result};
use crate::style::{Snapshot, StyleSet};

/// Inline declarations and class references of an element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Styled {
    pub styles: StyleSet,
    pub classes: Vec<String>,
}

impl Styled {
    /// Parse the `style` and `class` attribute values of `<tag>`.
    pub fn parse(tag: &str, style: Option<&str>, class: Option<&str>) -> Result<Self> {
        let styles = match style {
            Some(text) => StyleSet::parse(text)
                .map_err(|e| ForgeError::syntax(format!("style of <{tag}>"), e))?,
            None => StyleSet::new(),
        };
        let classes = class
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Ok(Self { styles, classes })
    }

    /// `base` → classes (with `selector` active) → inline styles.
    pub fn resolve(&self, classes: &ClassTable, selector: Option<&str>, base: &Snapshot) -> Snapshot {
        let mut resolved = base.clone();
        self.apply_to(classes, selector, &mut resolved);
        resolved
    }

    pub fn apply_to(&self, classes: &ClassTable, selector: Option<&str>, snapshot: &mut Snapshot) {
        classes.apply_to(selector, &self.classes, snapshot);
        self.styles.apply_to(snapshot);
    }
}

/// A content node.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub styled: Styled,
    pub kind: InstructionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    /// Folds its styles into the current snapshot of the processor.
    Font,
    Text {
        text: String,
    },
    Box {
        text: String,
    },
    Image {
        source: String,
    },
    /// Advance by `lines` × current font height.
    LineFeed {
        lines: f32,
    },
    SetX {
        x: f32,
    },
    SetY {
        y: f32,
        from_bottom: bool,
    },
    SetXY {
        x: f32,
        y: f32,
    },
    Table(Table),
    /// Only meaningful inside a [`Table`]; carries its own styles.
    TableRow(TableRow),
    /// Only meaningful inside a [`TableRow`]; carries its own styles.
    TableCell(TableCell),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    pub styled: Styled,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableCell {
    pub styled: Styled,
    /// Character data of the cell, accumulated across nested elements.
    pub content: String,
    /// Nested instructions, drawn at the cell's padded top-left corner.
    pub children: Vec<Instruction>,
}

impl Instruction {
    pub fn new(styled: Styled, kind: InstructionKind) -> Self {
        Self { styled, kind }
    }

    /// The styles that apply to this instruction.
    pub fn styled(&self) -> &Styled {
        match &self.kind {
            InstructionKind::TableRow(row) => &row.styled,
            InstructionKind::TableCell(cell) => &cell.styled,
            _ => &self.styled,
        }
    }

    pub fn tag(&self) -> &'static str {
        match &self.kind {
            InstructionKind::Font => "Font",
            InstructionKind::Text { .. } => "Text",
            InstructionKind::Box { .. } => "Box",
            InstructionKind::Image { .. } => "Image",
            InstructionKind::LineFeed { .. } => "Lf",
            InstructionKind::SetX { .. } => "SetX",
            InstructionKind::SetY { .. } => "SetY",
            InstructionKind::SetXY { .. } => "SetXY",
            InstructionKind::Table(_) => "table",
            InstructionKind::TableRow(_) => "tr",
            InstructionKind::TableCell(_) => "td",
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Nested content of an element, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Child(Instruction),
}

/// Everything a constructor needs to build an instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag: String,
    pub styled: Styled,
    /// Attributes other than `style` and `class`.
    pub attributes: BTreeMap<String, String>,
    pub content: Vec<Content>,
}

impl ElementData {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Numeric attribute; absent attributes yield `default`.
    pub fn number(&self, name: &str, default: f32) -> Result<f32> {
        match self.attr(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<f32>().map_err(|e| {
                ForgeError::Structure(format!(
                    "attribute {name}=\"{raw}\" of <{}>: {e}",
                    self.tag
                ))
            }),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.attr(name).map(str::trim) {
            None | Some("false") | Some("0") => Ok(false),
            Some("true") | Some("1") => Ok(true),
            Some(raw) => Err(ForgeError::Structure(format!(
                "attribute {name}=\"{raw}\" of <{}> is not a boolean",
                self.tag
            ))),
        }
    }

    /// All character data, concatenated.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                Content::Child(_) => None,
            })
            .collect()
    }

    /// Text content for leaf elements; nested elements are rejected.
    fn leaf_text(&self) -> Result<String> {
        if let Some(child) = self.content.iter().find_map(|c| match c {
            Content::Child(i) => Some(i),
            Content::Text(_) => None,
        }) {
            return Err(ForgeError::Structure(format!(
                "<{}> cannot contain <{}>",
                self.tag,
                child.tag()
            )));
        }
        Ok(self.text())
    }
}

pub type Constructor = fn(ElementData) -> Result<Instruction>;

/// Element tag → instruction constructor.
#[derive(Clone, Default)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in instructions.
    pub fn standard() -> Self {
        let mut r = Self::new();
        r.register("Font", build_font);
        r.register("Text", build_text);
        r.register("Box", build_box);
        r.register("Image", build_image);
        r.register("Lf", build_line_feed);
        r.register("SetX", build_set_x);
        r.register("SetY", build_set_y);
        r.register("SetXY", build_set_xy);
        r.register("table", build_table);
        r.register("tr", build_row);
        r.register("td", build_cell);
        r
    }

    pub fn register(&mut self, tag: &str, constructor: Constructor) {
        self.constructors.insert(tag.to_string(), constructor);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Build the instruction for `<tag>`. The reserved `style` and `class`
    /// attributes are parsed here for every element.
    pub fn decode_element(
        &self,
        tag: &str,
        mut attributes: BTreeMap<String, String>,
        content: Vec<Content>,
    ) -> Result<Instruction> {
        let constructor = self
            .constructors
            .get(tag)
            .ok_or_else(|| ForgeError::UnknownReference {
                tag: tag.to_string(),
            })?;
        let style = attributes.remove("style");
        let class = attributes.remove("class");
        let styled = Styled::parse(tag, style.as_deref(), class.as_deref())?;
        constructor(ElementData {
            tag: tag.to_string(),
            styled,
            attributes,
            content,
        })
    }
}

fn build_font(data: ElementData) -> Result<Instruction> {
    data.leaf_text()?;
    Ok(Instruction::new(data.styled, InstructionKind::Font))
}

fn build_text(data: ElementData) -> Result<Instruction> {
    let text = data.leaf_text()?;
    Ok(Instruction::new(data.styled, InstructionKind::Text { text }))
}

fn build_box(data: ElementData) -> Result<Instruction> {
    let text = data.leaf_text()?;
    Ok(Instruction::new(data.styled, InstructionKind::Box { text }))
}

fn build_image(data: ElementData) -> Result<Instruction> {
    let source = data.leaf_text()?.trim().to_string();
    if source.is_empty() {
        return Err(ForgeError::Structure("<Image> without source".into()));
    }
    Ok(Instruction::new(data.styled, InstructionKind::Image { source }))
}

fn build_line_feed(data: ElementData) -> Result<Instruction> {
    let lines = data.number("lines", 1.0)?;
    Ok(Instruction::new(data.styled, InstructionKind::LineFeed { lines }))
}

fn build_set_x(data: ElementData) -> Result<Instruction> {
    let x = data.number("x", 0.0)?;
    Ok(Instruction::new(data.styled, InstructionKind::SetX { x }))
}

fn build_set_y(data: ElementData) -> Result<Instruction> {
    let y = data.number("y", 0.0)?;
    let from_bottom = data.flag("from-bottom")?;
    Ok(Instruction::new(
        data.styled,
        InstructionKind::SetY { y, from_bottom },
    ))
}

fn build_set_xy(data: ElementData) -> Result<Instruction> {
    let x = data.number("x", 0.0)?;
    let y = data.number("y", 0.0)?;
    Ok(Instruction::new(data.styled, InstructionKind::SetXY { x, y }))
}

fn build_table(data: ElementData) -> Result<Instruction> {
    let mut rows = Vec::new();
    for content in data.content {
        match content {
            Content::Text(t) if t.trim().is_empty() => {}
            Content::Text(t) => {
                return Err(ForgeError::Structure(format!(
                    "<table> cannot contain text '{}'",
                    t.trim()
                )))
            }
            Content::Child(Instruction {
                kind: InstructionKind::TableRow(row),
                ..
            }) => rows.push(row),
            Content::Child(other) => {
                return Err(ForgeError::Structure(format!(
                    "<table> may only contain <tr>, found <{}>",
                    other.tag()
                )))
            }
        }
    }
    Ok(Instruction::new(
        data.styled,
        InstructionKind::Table(Table { rows }),
    ))
}

fn build_row(data: ElementData) -> Result<Instruction> {
    let mut cells = Vec::new();
    for content in data.content {
        match content {
            Content::Text(t) if t.trim().is_empty() => {}
            Content::Text(t) => {
                return Err(ForgeError::Structure(format!(
                    "<tr> cannot contain text '{}'",
                    t.trim()
                )))
            }
            Content::Child(Instruction {
                kind: InstructionKind::TableCell(cell),
                ..
            }) => cells.push(cell),
            Content::Child(other) => {
                return Err(ForgeError::Structure(format!(
                    "<tr> may only contain <td>, found <{}>",
                    other.tag()
                )))
            }
        }
    }
    Ok(Instruction::new(
        Styled::default(),
        InstructionKind::TableRow(TableRow {
            styled: data.styled,
            cells,
        }),
    ))
}

fn build_cell(data: ElementData) -> Result<Instruction> {
    let mut content = String::new();
    let mut children = Vec::new();
    for item in data.content {
        match item {
            Content::Text(t) => content.push_str(&t),
            Content::Child(child) => children.push(child),
        }
    }
    Ok(Instruction::new(
        Styled::default(),
        InstructionKind::TableCell(TableCell {
            styled: data.styled,
            content,
            children,
        }),
    ))
}
