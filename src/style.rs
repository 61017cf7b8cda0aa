//! Style value model – typed style properties, declaration sets, and the
//! resolved [`Snapshot`] consumed by the layout engine.
//!
//! Declarations use a small CSS-like grammar:
//!
//! ```text
//! font-family: arial; border: 1, 2, 3, 4; color: #ff0088;
//! ```
//!
//! Every property name maps to exactly one [`PropertyKind`] through a static
//! table, and every kind maps to exactly one field of the [`Snapshot`]. A
//! [`StyleSet`] holds at most one property per kind; resolving it onto a
//! snapshot is a left fold that never touches the base.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StyleError;

// ---------------------------------------------------------------------------
// Primitive values
// ---------------------------------------------------------------------------

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Parse `#RRGGBB` (the `#` is optional, digits are case-insensitive).
    ///
    /// Any literal that is not exactly six hex digits yields black rather
    /// than an error.
    pub fn from_hex(literal: &str) -> Self {
        let hex = literal.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Self::BLACK;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Self { r, g, b },
            _ => Self::BLACK,
        }
    }

    /// Channels scaled to `0.0..=1.0`.
    pub fn as_unit(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Four-sided box value, declared in the order left, top, right, bottom.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Edges {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Edges {
    pub const fn uniform(v: f32) -> Self {
        Self {
            left: v,
            top: v,
            right: v,
            bottom: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    fn parse(property: &str, literal: &str) -> Result<Self, StyleError> {
        let parts: Vec<&str> = literal.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(invalid(
                property,
                literal,
                format!("expected 4 comma separated values, got {}", parts.len()),
            ));
        }
        let mut values = [0.0f32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = parse_number(property, part)?;
        }
        Ok(Self {
            left: values[0],
            top: values[1],
            right: values[2],
            bottom: values[3],
        })
    }
}

impl fmt::Display for Edges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

// ---------------------------------------------------------------------------
// Keyword enums
// ---------------------------------------------------------------------------

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $kw:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            pub fn from_keyword(keyword: &str) -> Option<Self> {
                match keyword {
                    $($kw => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn keyword(self) -> &'static str {
                match self {
                    $(Self::$variant => $kw,)+
                }
            }
        }
    };
}

keyword_enum!(FontStyle { Normal => "normal", Italic => "italic" });
keyword_enum!(FontWeight { Normal => "normal", Bold => "bold" });
keyword_enum!(FontDecoration { Normal => "normal", Underline => "underline" });
keyword_enum!(
    /// Horizontal text alignment inside the available width.
    HAlign { Left => "left", Center => "center", Right => "right" }
);
keyword_enum!(
    /// Vertical alignment of cell content inside a table cell.
    VAlign { Top => "top", Middle => "middle", Bottom => "bottom" }
);

// ---------------------------------------------------------------------------
// Property kinds
// ---------------------------------------------------------------------------

/// Structural identity of a style property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    FontFamily,
    FontSize,
    FontStyle,
    FontWeight,
    FontDecoration,
    Border,
    Padding,
    Margin,
    LineWidth,
    Width,
    Height,
    LineHeight,
    ColumnWidth,
    OffsetX,
    OffsetY,
    HAlign,
    VAlign,
    Color,
    ForegroundColor,
    BackgroundColor,
    RowSpan,
    ColumnSpan,
}

/// Declaration name → kind. The first entry for a kind is its canonical name.
const PROPERTY_NAMES: &[(&str, PropertyKind)] = &[
    ("font-family", PropertyKind::FontFamily),
    ("font-size", PropertyKind::FontSize),
    ("font-point-size", PropertyKind::FontSize),
    ("font-style", PropertyKind::FontStyle),
    ("font-weight", PropertyKind::FontWeight),
    ("font-decoration", PropertyKind::FontDecoration),
    ("border", PropertyKind::Border),
    ("padding", PropertyKind::Padding),
    ("margin", PropertyKind::Margin),
    ("line-width", PropertyKind::LineWidth),
    ("width", PropertyKind::Width),
    ("height", PropertyKind::Height),
    ("line-height", PropertyKind::LineHeight),
    ("column-width", PropertyKind::ColumnWidth),
    ("offset-x", PropertyKind::OffsetX),
    ("offset-y", PropertyKind::OffsetY),
    ("h-align", PropertyKind::HAlign),
    ("v-align", PropertyKind::VAlign),
    ("color", PropertyKind::Color),
    ("foreground-color", PropertyKind::ForegroundColor),
    ("background-color", PropertyKind::BackgroundColor),
    ("row-span", PropertyKind::RowSpan),
    ("column-span", PropertyKind::ColumnSpan),
];

impl PropertyKind {
    pub fn from_name(name: &str) -> Option<Self> {
        PROPERTY_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
    }

    /// Canonical declaration name.
    pub fn name(self) -> &'static str {
        PROPERTY_NAMES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(n, _)| *n)
            .unwrap_or("unknown")
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// A single typed style declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleProperty {
    FontFamily(String),
    FontSize(f32),
    FontStyle(FontStyle),
    FontWeight(FontWeight),
    FontDecoration(FontDecoration),
    Border(Edges),
    Padding(Edges),
    Margin(Edges),
    LineWidth(f32),
    /// `None` is `auto`.
    Width(Option<f32>),
    Height(Option<f32>),
    LineHeight(f32),
    ColumnWidth(Option<f32>),
    OffsetX(f32),
    OffsetY(f32),
    HAlign(HAlign),
    VAlign(VAlign),
    Color(Rgb),
    ForegroundColor(Rgb),
    BackgroundColor(Rgb),
    RowSpan(usize),
    ColumnSpan(usize),
}

impl StyleProperty {
    /// Parse one `name: value` pair. Unknown names are rejected here, never
    /// at resolve time.
    pub fn parse(name: &str, value: &str) -> Result<Self, StyleError> {
        let name = name.trim();
        let value = value.trim();
        let kind =
            PropertyKind::from_name(name).ok_or_else(|| StyleError::UnknownProperty(name.into()))?;

        let prop = match kind {
            PropertyKind::FontFamily => {
                if value.is_empty() {
                    return Err(invalid(name, value, "empty font family"));
                }
                Self::FontFamily(value.to_string())
            }
            PropertyKind::FontSize => Self::FontSize(parse_positive(name, value)?),
            PropertyKind::FontStyle => Self::FontStyle(keyword(name, value, FontStyle::from_keyword)?),
            PropertyKind::FontWeight => {
                Self::FontWeight(keyword(name, value, FontWeight::from_keyword)?)
            }
            PropertyKind::FontDecoration => {
                Self::FontDecoration(keyword(name, value, FontDecoration::from_keyword)?)
            }
            PropertyKind::Border => Self::Border(Edges::parse(name, value)?),
            PropertyKind::Padding => Self::Padding(Edges::parse(name, value)?),
            PropertyKind::Margin => Self::Margin(Edges::parse(name, value)?),
            PropertyKind::LineWidth => Self::LineWidth(parse_number(name, value)?),
            PropertyKind::Width => Self::Width(parse_auto(name, value)?),
            PropertyKind::Height => Self::Height(parse_auto(name, value)?),
            PropertyKind::LineHeight => Self::LineHeight(parse_positive(name, value)?),
            PropertyKind::ColumnWidth => Self::ColumnWidth(parse_auto(name, value)?),
            PropertyKind::OffsetX => Self::OffsetX(parse_number(name, value)?),
            PropertyKind::OffsetY => Self::OffsetY(parse_number(name, value)?),
            PropertyKind::HAlign => Self::HAlign(keyword(name, value, HAlign::from_keyword)?),
            PropertyKind::VAlign => Self::VAlign(keyword(name, value, VAlign::from_keyword)?),
            PropertyKind::Color => Self::Color(Rgb::from_hex(value)),
            PropertyKind::ForegroundColor => Self::ForegroundColor(Rgb::from_hex(value)),
            PropertyKind::BackgroundColor => Self::BackgroundColor(Rgb::from_hex(value)),
            PropertyKind::RowSpan => Self::RowSpan(parse_span(name, value)?),
            PropertyKind::ColumnSpan => Self::ColumnSpan(parse_span(name, value)?),
        };
        Ok(prop)
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::FontFamily(_) => PropertyKind::FontFamily,
            Self::FontSize(_) => PropertyKind::FontSize,
            Self::FontStyle(_) => PropertyKind::FontStyle,
            Self::FontWeight(_) => PropertyKind::FontWeight,
            Self::FontDecoration(_) => PropertyKind::FontDecoration,
            Self::Border(_) => PropertyKind::Border,
            Self::Padding(_) => PropertyKind::Padding,
            Self::Margin(_) => PropertyKind::Margin,
            Self::LineWidth(_) => PropertyKind::LineWidth,
            Self::Width(_) => PropertyKind::Width,
            Self::Height(_) => PropertyKind::Height,
            Self::LineHeight(_) => PropertyKind::LineHeight,
            Self::ColumnWidth(_) => PropertyKind::ColumnWidth,
            Self::OffsetX(_) => PropertyKind::OffsetX,
            Self::OffsetY(_) => PropertyKind::OffsetY,
            Self::HAlign(_) => PropertyKind::HAlign,
            Self::VAlign(_) => PropertyKind::VAlign,
            Self::Color(_) => PropertyKind::Color,
            Self::ForegroundColor(_) => PropertyKind::ForegroundColor,
            Self::BackgroundColor(_) => PropertyKind::BackgroundColor,
            Self::RowSpan(_) => PropertyKind::RowSpan,
            Self::ColumnSpan(_) => PropertyKind::ColumnSpan,
        }
    }

    /// Write this property into its snapshot field.
    pub fn apply(&self, s: &mut Snapshot) {
        match self {
            Self::FontFamily(v) => s.font.family = v.clone(),
            Self::FontSize(v) => s.font.size = *v,
            Self::FontStyle(v) => s.font.style = *v,
            Self::FontWeight(v) => s.font.weight = *v,
            Self::FontDecoration(v) => s.font.decoration = *v,
            Self::Border(v) => s.box_model.border = *v,
            Self::Padding(v) => s.box_model.padding = *v,
            Self::Margin(v) => s.box_model.margin = *v,
            Self::LineWidth(v) => s.box_model.line_width = *v,
            Self::Width(v) => s.dimension.width = *v,
            Self::Height(v) => s.dimension.height = *v,
            Self::LineHeight(v) => s.dimension.line_height = *v,
            Self::ColumnWidth(v) => s.dimension.column_width = *v,
            Self::OffsetX(v) => s.dimension.offset_x = *v,
            Self::OffsetY(v) => s.dimension.offset_y = *v,
            Self::HAlign(v) => s.align.horizontal = *v,
            Self::VAlign(v) => s.align.vertical = *v,
            Self::Color(v) => s.color.text = *v,
            Self::ForegroundColor(v) => s.color.foreground = *v,
            Self::BackgroundColor(v) => s.color.background = *v,
            Self::RowSpan(v) => s.table.row_span = *v,
            Self::ColumnSpan(v) => s.table.column_span = *v,
        }
    }
}

impl fmt::Display for StyleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.kind().name())?;
        match self {
            Self::FontFamily(v) => write!(f, "{v}"),
            Self::FontStyle(v) => write!(f, "{}", v.keyword()),
            Self::FontWeight(v) => write!(f, "{}", v.keyword()),
            Self::FontDecoration(v) => write!(f, "{}", v.keyword()),
            Self::HAlign(v) => write!(f, "{}", v.keyword()),
            Self::VAlign(v) => write!(f, "{}", v.keyword()),
            Self::Border(v) | Self::Padding(v) | Self::Margin(v) => write!(f, "{v}"),
            Self::Width(v) | Self::Height(v) | Self::ColumnWidth(v) => match v {
                Some(n) => write!(f, "{n}"),
                None => write!(f, "auto"),
            },
            Self::FontSize(v)
            | Self::LineWidth(v)
            | Self::LineHeight(v)
            | Self::OffsetX(v)
            | Self::OffsetY(v) => write!(f, "{v}"),
            Self::Color(v) | Self::ForegroundColor(v) | Self::BackgroundColor(v) => {
                write!(f, "{v}")
            }
            Self::RowSpan(v) | Self::ColumnSpan(v) => write!(f, "{v}"),
        }
    }
}

fn invalid(property: &str, value: &str, reason: impl Into<String>) -> StyleError {
    StyleError::InvalidValue {
        property: property.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_number(property: &str, value: &str) -> Result<f32, StyleError> {
    match value.trim().parse::<f32>() {
        Ok(n) if n.is_finite() => Ok(n),
        Ok(_) => Err(invalid(property, value, "not a finite number")),
        Err(e) => Err(invalid(property, value, e.to_string())),
    }
}

fn parse_positive(property: &str, value: &str) -> Result<f32, StyleError> {
    let n = parse_number(property, value)?;
    if n <= 0.0 {
        return Err(invalid(property, value, "must be greater than zero"));
    }
    Ok(n)
}

fn parse_auto(property: &str, value: &str) -> Result<Option<f32>, StyleError> {
    if value.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    parse_number(property, value).map(Some)
}

fn parse_span(property: &str, value: &str) -> Result<usize, StyleError> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        Ok(_) => Err(invalid(property, value, "span must be at least 1")),
        Err(e) => Err(invalid(property, value, e.to_string())),
    }
}

fn keyword<T>(
    property: &str,
    value: &str,
    lookup: impl Fn(&str) -> Option<T>,
) -> Result<T, StyleError> {
    lookup(value).ok_or_else(|| invalid(property, value, "unrecognized keyword"))
}

// ---------------------------------------------------------------------------
// Style sets
// ---------------------------------------------------------------------------

/// An ordered list of declarations, unique by [`PropertyKind`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleSet {
    props: Vec<StyleProperty>,
}

impl StyleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `name: value; name: value; ...`. Empty declarations are skipped.
    pub fn parse(text: &str) -> Result<Self, StyleError> {
        let mut set = Self::new();
        for decl in text.split(';') {
            let decl = decl.trim();
            if decl.is_empty() {
                continue;
            }
            let parts: Vec<&str> = decl.split(':').collect();
            if parts.len() != 2 {
                return Err(StyleError::Declaration(decl.to_string()));
            }
            set.push(StyleProperty::parse(parts[0], parts[1])?)?;
        }
        Ok(set)
    }

    /// Add a declaration; a second declaration of the same kind is an error.
    pub fn push(&mut self, prop: StyleProperty) -> Result<(), StyleError> {
        if self.get(prop.kind()).is_some() {
            return Err(StyleError::Duplicate(prop.kind().name().to_string()));
        }
        self.props.push(prop);
        Ok(())
    }

    /// Add or overwrite the declaration of the property's kind.
    pub fn set(&mut self, prop: StyleProperty) {
        match self.props.iter_mut().find(|p| p.kind() == prop.kind()) {
            Some(slot) => *slot = prop,
            None => self.props.push(prop),
        }
    }

    pub fn get(&self, kind: PropertyKind) -> Option<&StyleProperty> {
        self.props.iter().find(|p| p.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleProperty> {
        self.props.iter()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// `self` followed by `later`, with `later` winning per property kind.
    pub fn merge(&self, later: &StyleSet) -> StyleSet {
        let mut merged = self.clone();
        for prop in &later.props {
            merged.set(prop.clone());
        }
        merged
    }

    /// Fold every declaration into `snapshot`, in declaration order.
    pub fn apply_to(&self, snapshot: &mut Snapshot) {
        for prop in &self.props {
            prop.apply(snapshot);
        }
    }

    /// A new snapshot: `base` with this set folded on top.
    pub fn resolve(&self, base: &Snapshot) -> Snapshot {
        let mut resolved = base.clone();
        self.apply_to(&mut resolved);
        resolved
    }
}

impl fmt::Display for StyleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, prop) in self.props.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{prop};")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Resolved snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontStyles {
    pub family: String,
    /// Point size, independent of the document unit.
    pub size: f32,
    pub style: FontStyle,
    pub weight: FontWeight,
    pub decoration: FontDecoration,
}

impl FontStyles {
    pub fn bold(&self) -> bool {
        self.weight == FontWeight::Bold
    }

    pub fn italic(&self) -> bool {
        self.style == FontStyle::Italic
    }

    pub fn underline(&self) -> bool {
        self.decoration == FontDecoration::Underline
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxModel {
    /// Border widths; a side is stroked when its value is positive.
    pub border: Edges,
    pub padding: Edges,
    pub margin: Edges,
    /// Stroke thickness used for borders.
    pub line_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimensions {
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Multiplier applied to the font height.
    pub line_height: f32,
    pub column_width: Option<f32>,
    pub offset_x: f32,
    pub offset_y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    pub horizontal: HAlign,
    pub vertical: VAlign,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Colors {
    pub text: Rgb,
    /// Stroke colour of borders.
    pub foreground: Rgb,
    /// Fill colour of boxes and cells.
    pub background: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpans {
    pub row_span: usize,
    pub column_span: usize,
}

/// Fully resolved style values for one instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub font: FontStyles,
    pub box_model: BoxModel,
    pub dimension: Dimensions,
    pub align: Alignment,
    pub color: Colors,
    pub table: TableSpans,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            font: FontStyles {
                family: "arial".to_string(),
                size: 12.0,
                style: FontStyle::Normal,
                weight: FontWeight::Normal,
                decoration: FontDecoration::Normal,
            },
            box_model: BoxModel {
                border: Edges::uniform(1.0),
                padding: Edges::uniform(2.0),
                margin: Edges::default(),
                line_width: 0.2,
            },
            dimension: Dimensions {
                width: None,
                height: None,
                line_height: 1.5,
                column_width: None,
                offset_x: 0.0,
                offset_y: 0.0,
            },
            align: Alignment {
                horizontal: HAlign::Left,
                vertical: VAlign::Top,
            },
            color: Colors {
                text: Rgb::BLACK,
                foreground: Rgb::BLACK,
                background: Rgb::WHITE,
            },
            table: TableSpans {
                row_span: 1,
                column_span: 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_family_and_border_only() {
        let set = StyleSet::parse("font-family: arial; border: 1, 2, 3, 4;").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.get(PropertyKind::FontFamily),
            Some(&StyleProperty::FontFamily("arial".into()))
        );
        assert_eq!(
            set.get(PropertyKind::Border),
            Some(&StyleProperty::Border(Edges {
                left: 1.0,
                top: 2.0,
                right: 3.0,
                bottom: 4.0
            }))
        );
    }

    #[test]
    fn color_literals() {
        let expected = Rgb {
            r: 255,
            g: 0,
            b: 136,
        };
        assert_eq!(Rgb::from_hex("#ff0088"), expected);
        assert_eq!(Rgb::from_hex("ff0088"), expected);
        assert_eq!(Rgb::from_hex("#FF0088"), expected);
        assert_eq!(Rgb::from_hex("bad"), Rgb::BLACK);
        assert_eq!(Rgb::from_hex("#zz0088"), Rgb::BLACK);
    }

    #[test]
    fn edges_need_all_four_parts() {
        assert!(StyleProperty::parse("padding", "1, 2, 3").is_err());
        assert!(StyleProperty::parse("padding", "1, 2, 3, 4, 5").is_err());
        assert!(StyleProperty::parse("margin", "1, x, 3, 4").is_err());
    }

    #[test]
    fn unknown_keyword_is_an_error() {
        let err = StyleProperty::parse("h-align", "justify").unwrap_err();
        assert!(matches!(err, StyleError::InvalidValue { .. }));
        assert!(StyleProperty::parse("font-weight", "heavy").is_err());
    }

    #[test]
    fn unknown_property_rejected_at_parse() {
        assert_eq!(
            StyleSet::parse("colour: #000000").unwrap_err(),
            StyleError::UnknownProperty("colour".into())
        );
    }

    #[test]
    fn duplicate_kind_rejected() {
        let err = StyleSet::parse("font-size: 10; font-point-size: 12").unwrap_err();
        assert_eq!(err, StyleError::Duplicate("font-size".into()));
    }

    #[test]
    fn declaration_needs_one_colon() {
        assert!(matches!(
            StyleSet::parse("width 10").unwrap_err(),
            StyleError::Declaration(_)
        ));
    }

    #[test]
    fn resolve_leaves_base_untouched() {
        let base = Snapshot::default();
        let set = StyleSet::parse("font-size: 20; h-align: right").unwrap();
        let resolved = set.resolve(&base);
        assert_eq!(base, Snapshot::default());
        assert_eq!(resolved.font.size, 20.0);
        assert_eq!(resolved.align.horizontal, HAlign::Right);
    }

    #[test]
    fn fold_matches_merge() {
        let a = StyleSet::parse("font-size: 10; color: #112233; width: 40").unwrap();
        let b = StyleSet::parse("font-size: 14; width: auto; v-align: bottom").unwrap();
        let base = Snapshot::default();
        let sequential = b.resolve(&a.resolve(&base));
        let merged = a.merge(&b).resolve(&base);
        assert_eq!(sequential, merged);
        assert_eq!(merged.dimension.width, None);
        assert_eq!(merged.font.size, 14.0);
    }

    #[test]
    fn display_reparses_identically() {
        let set = StyleSet::parse(
            "border: 0.5, 1, 0, 2; width: auto; color: #ff0088; row-span: 2; font-style: italic",
        )
        .unwrap();
        let reparsed = StyleSet::parse(&set.to_string()).unwrap();
        assert_eq!(set, reparsed);
    }

    #[test]
    fn span_must_be_positive_integer() {
        assert!(StyleProperty::parse("row-span", "0").is_err());
        assert!(StyleProperty::parse("column-span", "1.5").is_err());
        assert_eq!(
            StyleProperty::parse("row-span", " 3 ").unwrap(),
            StyleProperty::RowSpan(3)
        );
    }
}
