use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, FieldErrors, Result};

pub const NOME_MAX_LENGTH: usize = 255;
pub const PRECO_MAX_DIGITS: u32 = 10;
pub const PRECO_DECIMAL_PLACES: u32 = 2;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub nome: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub preco: Decimal,
    pub estoque: i32,
    pub descricao: String,
}

/// Validated write payload for create and full-replacement update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub nome: String,
    pub preco: Decimal,
    pub estoque: i32,
    pub descricao: String,
}

impl NewProduct {
    pub fn into_product(self, id: i64) -> Product {
        Product {
            id,
            nome: self.nome,
            preco: self.preco,
            estoque: self.estoque,
            descricao: self.descricao,
        }
    }

    /// Validates a decoded JSON body, collecting every failing field before
    /// returning so the caller sees all problems at once.
    pub fn from_json(body: &Value) -> Result<Self> {
        let fields = match body {
            Value::Object(map) => map,
            other => {
                return Err(AppError::field(
                    "non_field_errors",
                    &format!(
                        "Invalid data. Expected a dictionary, but got {}.",
                        json_type_name(other)
                    ),
                ));
            }
        };

        let mut errors = FieldErrors::new();
        let nome = collect(&mut errors, "nome", validate_nome(fields));
        let preco = collect(&mut errors, "preco", validate_preco(fields));
        let estoque = collect(&mut errors, "estoque", validate_estoque(fields));
        let descricao = collect(&mut errors, "descricao", validate_descricao(fields));

        match (nome, preco, estoque, descricao) {
            (Some(nome), Some(preco), Some(estoque), Some(descricao)) if errors.is_empty() => {
                Ok(Self {
                    nome,
                    preco,
                    estoque,
                    descricao,
                })
            }
            _ => Err(AppError::Validation(errors)),
        }
    }
}

fn collect<T>(
    errors: &mut FieldErrors,
    field: &str,
    result: std::result::Result<T, String>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.entry(field.to_string()).or_default().push(message);
            None
        }
    }
}

fn required<'a>(
    fields: &'a Map<String, Value>,
    name: &str,
) -> std::result::Result<&'a Value, String> {
    match fields.get(name) {
        None => Err(REQUIRED.to_string()),
        Some(Value::Null) => Err(NOT_NULL.to_string()),
        Some(value) => Ok(value),
    }
}

fn validate_nome(fields: &Map<String, Value>) -> std::result::Result<String, String> {
    let nome = match required(fields, "nome")? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err("Not a valid string.".to_string()),
    };

    if nome.is_empty() {
        return Err("This field may not be blank.".to_string());
    }

    if nome.chars().count() > NOME_MAX_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            NOME_MAX_LENGTH
        ));
    }

    Ok(nome)
}

fn validate_preco(fields: &Map<String, Value>) -> std::result::Result<Decimal, String> {
    const INVALID: &str = "A valid number is required.";

    let raw = match required(fields, "preco")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(INVALID.to_string()),
    };

    let preco = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| INVALID.to_string())?;

    let decimal_places = preco.scale();
    let whole_digits = digit_count(preco.trunc());

    if whole_digits + decimal_places > PRECO_MAX_DIGITS {
        return Err(format!(
            "Ensure that there are no more than {} digits in total.",
            PRECO_MAX_DIGITS
        ));
    }

    if decimal_places > PRECO_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            PRECO_DECIMAL_PLACES
        ));
    }

    if whole_digits > PRECO_MAX_DIGITS - PRECO_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            PRECO_MAX_DIGITS - PRECO_DECIMAL_PLACES
        ));
    }

    Ok(preco)
}

fn digit_count(whole: Decimal) -> u32 {
    if whole.is_zero() {
        0
    } else {
        whole.abs().normalize().to_string().len() as u32
    }
}

fn validate_estoque(fields: &Map<String, Value>) -> std::result::Result<i32, String> {
    const INVALID: &str = "A valid integer is required.";

    let value = match required(fields, "estoque")? {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => f as i64,
            _ => return Err(INVALID.to_string()),
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| INVALID.to_string())?,
        _ => return Err(INVALID.to_string()),
    };

    if value > i32::MAX as i64 {
        return Err(format!(
            "Ensure this value is less than or equal to {}.",
            i32::MAX
        ));
    }
    if value < i32::MIN as i64 {
        return Err(format!(
            "Ensure this value is greater than or equal to {}.",
            i32::MIN
        ));
    }

    Ok(value as i32)
}

fn validate_descricao(fields: &Map<String, Value>) -> std::result::Result<String, String> {
    match fields.get("descricao") {
        None => Ok(String::new()),
        Some(Value::Null) => Err(NOT_NULL.to_string()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err("Not a valid string.".to_string()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
