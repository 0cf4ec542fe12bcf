//! Column type registry
//!
//! Maps a ClickHouse type name to a conversion strategy and a default literal.
//! Dispatch is table driven: plain names are looked up in [`SCALAR_TYPES`],
//! parameterized names (`Base(args)`) by their base in [`PARAMETERIZED_TYPES`].
//! Adding a store type means adding a row to one of the tables.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{ConversionError, SchemaError};
use crate::literal::{format_fixed_point, format_float, is_integer_text, quote_string};
use crate::value::Value;

/// Default precision of a bare `DateTime64`
const DEFAULT_DATETIME64_PRECISION: u32 = 3;

/// Highest precision ClickHouse accepts for `DateTime64`
const MAX_DATETIME64_PRECISION: u32 = 9;

/// `2^256 - 1`
const UINT256_MAX: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

/// `2^255`, the magnitude of the smallest `Int256`
const INT256_MIN_MAGNITUDE: &str =
    "57896044618658097711785492504343953926634992332820282019728792003956564819968";

/// `2^255 - 1`
const INT256_MAX: &str =
    "57896044618658097711785492504343953926634992332820282019728792003956564819967";

/// Conversion strategy for a column type
#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Int { signed: bool, bits: u32 },
    Float,
    Bool,
    String,
    FixedString(usize),
    Enum(Box<EnumValues>),
    Date,
    DateTime,
    DateTime64 { precision: u32 },
    Array(Box<ColumnType>),
    Nullable(Box<ColumnType>),
    LowCardinality(Box<ColumnType>),
}

/// Types addressed by their exact name
const SCALAR_TYPES: &[(&str, Kind)] = &[
    ("Int8", Kind::Int { signed: true, bits: 8 }),
    ("Int16", Kind::Int { signed: true, bits: 16 }),
    ("Int32", Kind::Int { signed: true, bits: 32 }),
    ("Int64", Kind::Int { signed: true, bits: 64 }),
    ("Int128", Kind::Int { signed: true, bits: 128 }),
    ("Int256", Kind::Int { signed: true, bits: 256 }),
    ("UInt8", Kind::Int { signed: false, bits: 8 }),
    ("UInt16", Kind::Int { signed: false, bits: 16 }),
    ("UInt32", Kind::Int { signed: false, bits: 32 }),
    ("UInt64", Kind::Int { signed: false, bits: 64 }),
    ("UInt128", Kind::Int { signed: false, bits: 128 }),
    ("UInt256", Kind::Int { signed: false, bits: 256 }),
    ("Float32", Kind::Float),
    ("Float64", Kind::Float),
    ("Bool", Kind::Bool),
    ("String", Kind::String),
    ("UUID", Kind::String),
    ("Date", Kind::Date),
    ("Date32", Kind::Date),
    ("DateTime", Kind::DateTime),
    (
        "DateTime64",
        Kind::DateTime64 {
            precision: DEFAULT_DATETIME64_PRECISION,
        },
    ),
];

type ParseArgs = fn(&str) -> Result<Kind, SchemaError>;

/// Types written as `Base(args)`, keyed by `Base`
const PARAMETERIZED_TYPES: &[(&str, ParseArgs)] = &[
    ("Array", parse_array_args),
    ("Nullable", parse_nullable_args),
    ("LowCardinality", parse_low_cardinality_args),
    ("FixedString", parse_fixed_string_args),
    ("Enum8", |args| parse_enum_args(args, i8::MIN.into(), i8::MAX.into())),
    ("Enum16", |args| parse_enum_args(args, i16::MIN.into(), i16::MAX.into())),
    // Timezone argument; literals are written as UTC wall-clock time
    ("DateTime", |_| Ok(Kind::DateTime)),
    ("DateTime64", parse_datetime64_args),
];

fn parse_array_args(args: &str) -> Result<Kind, SchemaError> {
    Ok(Kind::Array(Box::new(ColumnType::parse(args)?)))
}

fn parse_nullable_args(args: &str) -> Result<Kind, SchemaError> {
    Ok(Kind::Nullable(Box::new(ColumnType::parse(args)?)))
}

fn parse_low_cardinality_args(args: &str) -> Result<Kind, SchemaError> {
    Ok(Kind::LowCardinality(Box::new(ColumnType::parse(args)?)))
}

fn parse_fixed_string_args(args: &str) -> Result<Kind, SchemaError> {
    args.parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .map(Kind::FixedString)
        .ok_or_else(|| SchemaError::unsupported_type(format!("FixedString({args})")))
}

fn parse_enum_args(args: &str, min: i64, max: i64) -> Result<Kind, SchemaError> {
    EnumValues::parse(args, min, max)
        .map(|values| Kind::Enum(Box::new(values)))
        .ok_or_else(|| SchemaError::unsupported_type(format!("Enum({args})")))
}

fn parse_datetime64_args(args: &str) -> Result<Kind, SchemaError> {
    let precision = args
        .split(',')
        .next()
        .map(str::trim)
        .and_then(|p| p.parse::<u32>().ok())
        .filter(|p| *p <= MAX_DATETIME64_PRECISION)
        .ok_or_else(|| SchemaError::unsupported_type(format!("DateTime64({args})")))?;
    Ok(Kind::DateTime64 { precision })
}

/// A ClickHouse column type: name, converter, default literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    name: String,
    kind: Kind,
}

impl ColumnType {
    /// Look up the converter for a ClickHouse type name
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] for names the registry does
    /// not know, including malformed parameter lists.
    pub fn parse(type_name: &str) -> Result<Self, SchemaError> {
        let name = type_name.trim();

        if let Some((_, kind)) = SCALAR_TYPES.iter().find(|(n, _)| *n == name) {
            return Ok(Self {
                name: name.to_owned(),
                kind: kind.clone(),
            });
        }

        let (base, args) = split_parameters(name)
            .ok_or_else(|| SchemaError::unsupported_type(name))?;

        let (_, parse_args) = PARAMETERIZED_TYPES
            .iter()
            .find(|(b, _)| *b == base)
            .ok_or_else(|| SchemaError::unsupported_type(name))?;

        let kind = parse_args(args).map_err(|_| SchemaError::unsupported_type(name))?;
        Ok(Self {
            name: name.to_owned(),
            kind,
        })
    }

    /// Type name as given to [`ColumnType::parse`]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Literal used for columns that are never set
    ///
    /// An enum defaults to its member with the smallest code, as the server
    /// does.
    pub fn default_value(&self) -> Cow<'static, str> {
        match &self.kind {
            Kind::Int { .. }
            | Kind::Float
            | Kind::Date
            | Kind::DateTime
            | Kind::DateTime64 { .. } => Cow::Borrowed("0"),
            Kind::Bool => Cow::Borrowed("false"),
            Kind::String | Kind::FixedString(_) => Cow::Borrowed("''"),
            Kind::Enum(values) => Cow::Owned(quote_string(values.default_name())),
            Kind::Array(_) => Cow::Borrowed("[]"),
            Kind::Nullable(_) => Cow::Borrowed("NULL"),
            Kind::LowCardinality(inner) => inner.default_value(),
        }
    }

    /// Convert a value into this type's literal
    ///
    /// `Null` renders as `NULL` for `Nullable` types and as the default
    /// literal for everything else.
    pub fn convert(&self, value: &Value) -> Result<String, ConversionError> {
        match (&self.kind, value) {
            (Kind::Nullable(_), Value::Null) => Ok("NULL".to_owned()),
            (_, Value::Null) => Ok(self.default_value().into_owned()),
            (Kind::Int { signed, bits }, v) => self.convert_int(v, *signed, *bits),
            (Kind::Float, v) => self.convert_float(v),
            (Kind::Bool, v) => self.convert_bool(v),
            (Kind::String, v) => Ok(quote_string(&self.string_text(v)?)),
            (Kind::FixedString(width), v) => self.convert_fixed_string(v, *width),
            (Kind::Enum(values), v) => self.convert_enum(v, values),
            (Kind::Date, v) => self.convert_date(v),
            (Kind::DateTime, v) => self.convert_datetime(v),
            (Kind::DateTime64 { precision }, v) => self.convert_datetime64(v, *precision),
            (Kind::Array(element), v) => self.convert_array(element, v),
            (Kind::Nullable(inner) | Kind::LowCardinality(inner), v) => inner.convert(v),
        }
    }

    fn reject(&self, value: &Value, reason: impl Into<String>) -> ConversionError {
        ConversionError::new(&self.name, value.kind(), reason)
    }

    fn convert_int(&self, value: &Value, signed: bool, bits: u32) -> Result<String, ConversionError> {
        let text = match value {
            Value::Bool(b) => return Ok(if *b { "1" } else { "0" }.to_owned()),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
            Value::Float(_) => return Err(self.reject(value, "float is not integral")),
            Value::String(s) if is_integer_text(s.trim()) => s.trim().to_owned(),
            Value::String(_) => return Err(self.reject(value, "not an integer")),
            _ => return Err(self.reject(value, "expected a number")),
        };

        fit_integer(&text, signed, bits)
            .ok_or_else(|| self.reject(value, format!("{text} is out of range")))
    }

    fn convert_float(&self, value: &Value) -> Result<String, ConversionError> {
        match value {
            Value::Float(f) => Ok(format_float(*f)),
            Value::Int(i) => Ok(i.to_string()),
            Value::UInt(u) => Ok(u.to_string()),
            Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_owned()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(format_float)
                .map_err(|_| self.reject(value, "not a number")),
            _ => Err(self.reject(value, "expected a number")),
        }
    }

    fn convert_bool(&self, value: &Value) -> Result<String, ConversionError> {
        let b = match value {
            Value::Bool(b) => *b,
            Value::Int(0) | Value::UInt(0) => false,
            Value::Int(1) | Value::UInt(1) => true,
            Value::String(s) if s.eq_ignore_ascii_case("true") => true,
            Value::String(s) if s.eq_ignore_ascii_case("false") => false,
            _ => return Err(self.reject(value, "expected true/false or 0/1")),
        };
        Ok(if b { "true" } else { "false" }.to_owned())
    }

    /// Unquoted text of a scalar written into a string column
    fn string_text<'v>(&self, value: &'v Value) -> Result<Cow<'v, str>, ConversionError> {
        match value {
            Value::String(s) => Ok(Cow::Borrowed(s)),
            Value::Bool(b) => Ok(Cow::Owned(b.to_string())),
            Value::Int(i) => Ok(Cow::Owned(i.to_string())),
            Value::UInt(u) => Ok(Cow::Owned(u.to_string())),
            Value::Float(f) => Ok(Cow::Owned(format_float(*f))),
            Value::Date(d) => Ok(Cow::Owned(d.format("%Y-%m-%d").to_string())),
            Value::DateTime(dt) => Ok(Cow::Owned(dt.to_rfc3339())),
            _ => Err(self.reject(value, "expected a scalar")),
        }
    }

    fn convert_fixed_string(&self, value: &Value, width: usize) -> Result<String, ConversionError> {
        let text = self.string_text(value)?;
        if text.len() > width {
            return Err(self.reject(
                value,
                format!("{} bytes do not fit in {width}", text.len()),
            ));
        }
        Ok(quote_string(&text))
    }

    fn convert_enum(&self, value: &Value, values: &EnumValues) -> Result<String, ConversionError> {
        match value {
            Value::String(s) if values.has_name(s) => Ok(quote_string(s)),
            Value::String(s) => Err(self.reject(value, format!("'{s}' is not a member"))),
            Value::Int(i) if values.has_code(*i) => Ok(i.to_string()),
            Value::UInt(u) if i64::try_from(*u).is_ok_and(|c| values.has_code(c)) => {
                Ok(u.to_string())
            }
            Value::Int(_) | Value::UInt(_) => Err(self.reject(value, "code is not a member")),
            _ => Err(self.reject(value, "expected an enum name or code")),
        }
    }

    fn convert_date(&self, value: &Value) -> Result<String, ConversionError> {
        let date = match value {
            Value::Date(d) => *d,
            Value::DateTime(dt) => dt.date_naive(),
            Value::Int(_) | Value::UInt(_) | Value::String(_) => {
                self.to_timestamp(value)?.date_naive()
            }
            _ => return Err(self.reject(value, "expected a date")),
        };
        Ok(format!("'{}'", date.format("%Y-%m-%d")))
    }

    fn convert_datetime(&self, value: &Value) -> Result<String, ConversionError> {
        let dt = self.to_timestamp(value)?;
        Ok(format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")))
    }

    fn convert_datetime64(&self, value: &Value, precision: u32) -> Result<String, ConversionError> {
        let numeric = match value {
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let (secs, nanos) = match numeric {
            Some(f) => self.split_float_seconds(value, f)?,
            None => {
                let dt = self.to_timestamp(value)?;
                (dt.timestamp(), dt.timestamp_subsec_nanos())
            }
        };
        Ok(format_fixed_point(secs, nanos, precision))
    }

    fn convert_array(&self, element: &ColumnType, value: &Value) -> Result<String, ConversionError> {
        let Value::Array(items) = value else {
            return Err(self.reject(value, "expected an array"));
        };

        let mut out = String::with_capacity(items.len() * 4 + 2);
        out.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&element.convert(item)?);
        }
        out.push(']');
        Ok(out)
    }

    /// Interpret dates, timestamps, epoch seconds and ISO-8601 text as UTC
    fn to_timestamp(&self, value: &Value) -> Result<DateTime<Utc>, ConversionError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN).and_utc()),
            Value::Int(secs) => DateTime::from_timestamp(*secs, 0)
                .ok_or_else(|| self.reject(value, "timestamp out of range")),
            Value::UInt(secs) => i64::try_from(*secs)
                .ok()
                .and_then(|s| DateTime::from_timestamp(s, 0))
                .ok_or_else(|| self.reject(value, "timestamp out of range")),
            Value::Float(f) => {
                let (secs, nanos) = self.split_float_seconds(value, *f)?;
                DateTime::from_timestamp(secs, nanos)
                    .ok_or_else(|| self.reject(value, "timestamp out of range"))
            }
            Value::String(s) => parse_timestamp(s.trim())
                .ok_or_else(|| self.reject(value, format!("unrecognized date/time '{s}'"))),
            _ => Err(self.reject(value, "expected a date/time")),
        }
    }

    fn split_float_seconds(&self, value: &Value, f: f64) -> Result<(i64, u32), ConversionError> {
        if !f.is_finite() || f.abs() >= i64::MAX as f64 {
            return Err(self.reject(value, "timestamp out of range"));
        }
        let secs = f.floor();
        let nanos = ((f - secs) * 1e9).round() as u32;
        // Rounding can push the fraction to a full second
        if nanos >= 1_000_000_000 {
            Ok((secs as i64 + 1, 0))
        } else {
            Ok((secs as i64, nanos))
        }
    }
}

// =============================================================================
// Integer Range
// =============================================================================

/// Canonical decimal text of `text` if the integer type can hold it
///
/// Compares decimal digits so the 128 and 256-bit types need no big integer.
fn fit_integer(text: &str, signed: bool, bits: u32) -> Option<String> {
    let text = text.strip_prefix('+').unwrap_or(text);
    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text),
    };
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some("0".to_owned());
    }
    if negative && !signed {
        return None;
    }

    let limit = integer_limit(signed, bits, negative);
    let fits = digits.len() < limit.len() || (digits.len() == limit.len() && digits <= &*limit);
    if !fits {
        return None;
    }

    Some(if negative {
        format!("-{digits}")
    } else {
        digits.to_owned()
    })
}

/// Largest magnitude the type holds on one side of zero
fn integer_limit(signed: bool, bits: u32, negative: bool) -> Cow<'static, str> {
    match (signed, bits) {
        (false, 256) => Cow::Borrowed(UINT256_MAX),
        (true, 256) if negative => Cow::Borrowed(INT256_MIN_MAGNITUDE),
        (true, 256) => Cow::Borrowed(INT256_MAX),
        (false, 128) => Cow::Owned(u128::MAX.to_string()),
        (false, _) => Cow::Owned(((1u128 << bits) - 1).to_string()),
        (true, _) => {
            let magnitude = 1u128 << (bits - 1);
            let limit = if negative { magnitude } else { magnitude - 1 };
            Cow::Owned(limit.to_string())
        }
    }
}

// =============================================================================
// Enum Members
// =============================================================================

/// Names and codes declared by `Enum8(...)` / `Enum16(...)`
#[derive(Debug, Clone, PartialEq, Eq)]
struct EnumValues {
    members: Vec<(String, i64)>,
}

impl EnumValues {
    /// Parse `'a' = 1, 'b' = 2`; members without a code continue from the
    /// previous one, starting at 1
    fn parse(args: &str, min: i64, max: i64) -> Option<Self> {
        let mut members: Vec<(String, i64)> = Vec::new();
        let mut rest = args.trim();
        let mut next_code = 1;

        while !rest.is_empty() {
            let (name, after) = take_quoted(rest)?;
            rest = after.trim_start();

            let code = match rest.strip_prefix('=') {
                Some(after_eq) => {
                    let end = after_eq.find(',').unwrap_or(after_eq.len());
                    let code = after_eq[..end].trim().parse::<i64>().ok()?;
                    rest = &after_eq[end..];
                    code
                }
                None => next_code,
            };

            if !(min..=max).contains(&code)
                || members.iter().any(|(n, c)| *n == name || *c == code)
            {
                return None;
            }
            members.push((name, code));
            next_code = code + 1;

            rest = rest.trim_start();
            if let Some(after_comma) = rest.strip_prefix(',') {
                rest = after_comma.trim_start();
            } else if !rest.is_empty() {
                return None;
            }
        }

        (!members.is_empty()).then_some(Self { members })
    }

    fn has_name(&self, name: &str) -> bool {
        self.members.iter().any(|(n, _)| n == name)
    }

    fn has_code(&self, code: i64) -> bool {
        self.members.iter().any(|(_, c)| *c == code)
    }

    fn default_name(&self) -> &str {
        self.members
            .iter()
            .min_by_key(|(_, code)| *code)
            .map_or("", |(name, _)| name.as_str())
    }
}

/// Split a leading single-quoted string off `s`, unescaping `\x` and `''`
fn take_quoted(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('\'')?;
    let mut name = String::new();
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next()?;
                name.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
            }
            '\'' if body[i + 1..].starts_with('\'') => {
                chars.next();
                name.push('\'');
            }
            '\'' => return Some((name, &body[i + 1..])),
            c => name.push(c),
        }
    }

    None
}

/// Split `Base(args)` into its base name and argument text
fn split_parameters(name: &str) -> Option<(&str, &str)> {
    let open = name.find('(')?;
    let inner = name.strip_suffix(')')?;
    let base = name[..open].trim_end();
    let args = inner[open + 1..].trim();
    Some((base, args))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
}
