use crate::error::ChartError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// One data row as it arrives: field name to raw JSON value.
pub type RawRecord = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Column,
    Pie,
    Radial,
    Treemap,
}

impl ChartKind {
    pub const ALL: [Self; 5] = [
        Self::Bar,
        Self::Column,
        Self::Pie,
        Self::Radial,
        Self::Treemap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Column => "column",
            Self::Pie => "pie",
            Self::Radial => "radial",
            Self::Treemap => "treemap",
        }
    }
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "column" => Ok(Self::Column),
            "pie" | "donut" => Ok(Self::Pie),
            "radial" => Ok(Self::Radial),
            "treemap" => Ok(Self::Treemap),
            other => Err(ChartError::config(format!("unknown chart kind: {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    X,
    Y,
    Y2,
    Group,
}

impl FieldRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Y2 => "y2",
            Self::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub role: FieldRole,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl FieldSpec {
    /// Human-facing title for axis headers and legends.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Render a numeric value the way it is labelled on marks: up to two
    /// decimals, integer values without a fraction, unit suffix when set.
    pub fn format_value(&self, value: f64) -> String {
        let rounded = (value * 100.0).round() / 100.0;
        let number = if (rounded - rounded.round()).abs() < 0.001 {
            format!("{:.0}", rounded)
        } else {
            format!("{:.2}", rounded)
        };
        match self.unit.as_deref() {
            Some(unit) if !unit.is_empty() => format!("{number} {unit}"),
            _ => number,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSection {
    #[serde(default)]
    pub data: Vec<RawRecord>,
    #[serde(default)]
    pub columns: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontToken {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: String,
}

impl Default for FontToken {
    fn default() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            font_weight: "normal".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Typography {
    pub title: Option<FontToken>,
    pub label: Option<FontToken>,
    pub description: Option<FontToken>,
    pub annotation: Option<FontToken>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorTokens {
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    pub other: BTreeMap<String, String>,
    pub field: BTreeMap<String, String>,
    pub available_colors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    pub field: BTreeMap<String, String>,
    pub other: BTreeMap<String, String>,
}

/// The whole input payload of one render call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Payload {
    pub data: DataSection,
    pub variables: serde_json::Map<String, serde_json::Value>,
    pub typography: Typography,
    pub colors: ColorTokens,
    pub colors_dark: Option<ColorTokens>,
    pub images: Images,
}

/// Parse a payload from strict JSON, falling back to JSON5 for hand-written
/// files with comments or trailing commas.
pub fn parse_payload(input: &str) -> Result<Payload, ChartError> {
    match serde_json::from_str::<Payload>(input) {
        Ok(payload) => Ok(payload),
        Err(json_err) => json5::from_str::<Payload>(input).map_err(|_| {
            ChartError::config(format!("payload is not valid JSON: {json_err}"))
        }),
    }
}

/// One coerced data row. `category` comes from the x-role field, `value`
/// from y, `secondary` from y2, `group` from the group field.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub category: String,
    pub value: f64,
    pub secondary: Option<f64>,
    pub group: Option<String>,
}

/// Validated, coerced view of the payload's tabular section. Built once per
/// render; read-only afterwards.
#[derive(Debug, Clone)]
pub struct DataFrame {
    pub x_field: FieldSpec,
    pub y_field: FieldSpec,
    pub y2_field: Option<FieldSpec>,
    pub group_field: Option<FieldSpec>,
    pub rows: Vec<Row>,
}

impl DataFrame {
    pub fn from_payload(payload: &Payload) -> Result<Self, ChartError> {
        let columns = &payload.data.columns;
        if columns.is_empty() {
            return Err(ChartError::config("data.columns is empty"));
        }

        let x_field = required_role(columns, FieldRole::X)?;
        let y_field = required_role(columns, FieldRole::Y)?;
        let y2_field = optional_role(columns, FieldRole::Y2)?;
        let group_field = optional_role(columns, FieldRole::Group)?;

        let mut rows = Vec::with_capacity(payload.data.data.len());
        for record in &payload.data.data {
            let Some(category) = record.get(&x_field.name).map(stringify) else {
                tracing::debug!(field = %x_field.name, "record without category field skipped");
                continue;
            };
            let Some(value) = record.get(&y_field.name).and_then(coerce_number) else {
                tracing::debug!(field = %y_field.name, %category, "non-numeric value skipped");
                continue;
            };
            let secondary = y2_field
                .as_ref()
                .and_then(|field| record.get(&field.name))
                .and_then(coerce_number);
            let group = group_field
                .as_ref()
                .and_then(|field| record.get(&field.name))
                .map(stringify);
            rows.push(Row {
                category,
                value,
                secondary,
                group,
            });
        }

        Ok(Self {
            x_field,
            y_field,
            y2_field,
            group_field,
            rows,
        })
    }

    /// Labels exactly as each mark will carry them, in row order.
    pub fn value_labels(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| self.y_field.format_value(row.value))
            .collect()
    }

    pub fn category_labels(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.category.clone()).collect()
    }

    pub fn max_value(&self) -> f64 {
        self.rows.iter().map(|row| row.value).fold(0.0, f64::max)
    }
}

fn required_role(columns: &[FieldSpec], role: FieldRole) -> Result<FieldSpec, ChartError> {
    match optional_role(columns, role)? {
        Some(field) => Ok(field),
        None => Err(ChartError::config(format!(
            "no column with role {:?} in data.columns",
            role.as_str()
        ))),
    }
}

fn optional_role(columns: &[FieldSpec], role: FieldRole) -> Result<Option<FieldSpec>, ChartError> {
    let mut matches = columns.iter().filter(|field| field.role == role);
    let first = matches.next();
    if matches.next().is_some() {
        return Err(ChartError::config(format!(
            "more than one column with role {:?}",
            role.as_str()
        )));
    }
    Ok(first.cloned())
}

fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Number(number) => number.to_string(),
        serde_json::Value::Bool(flag) => flag.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Numeric coercion for value-role fields. Strings are accepted when they
/// parse as a number after trimming whitespace and thousands separators.
fn coerce_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => {
            let cleaned: String = text.trim().replace(',', "");
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}
