//! Declarative form schemas
//!
//! Payloads for create/update calls are checked against a static field list
//! before any request is sent. A field reports at most one error: the first
//! rule it fails.

use crate::error::{FieldError, ValidationError};
use crate::utils::validation::is_valid_email;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Required,
    Min(f64),
    MinLength(usize),
    Email,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub label: &'static str,
    pub rules: &'static [Rule],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSchema],
}

/// `Full` checks every field (create); `Partial` only fields present in the payload (update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Full,
    Partial,
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

impl FieldSchema {
    fn check(&self, value: Option<&Value>) -> Option<String> {
        let blank = is_blank(value);
        for rule in self.rules {
            let failure = match (rule, value) {
                (Rule::Required, _) if blank => Some(format!("{} is required", self.label)),
                (Rule::Required, _) => None,
                // remaining rules only apply to values that were actually given
                (_, _) if blank => None,
                (_, None) => None,
                (Rule::Min(min), Some(v)) => match as_number(v) {
                    None => Some(format!("{} must be a number", self.label)),
                    Some(n) if n < *min => {
                        Some(format!("{} must be at least {}", self.label, min))
                    }
                    Some(_) => None,
                },
                (Rule::MinLength(len), Some(v)) => match v.as_str() {
                    Some(s) if s.trim().chars().count() < *len => Some(format!(
                        "{} must be at least {} characters",
                        self.label, len
                    )),
                    _ => None,
                },
                (Rule::Email, Some(v)) => match v.as_str() {
                    Some(s) if is_valid_email(s) => None,
                    _ => Some(format!("{} must be a valid email address", self.label)),
                },
                (Rule::OneOf(options), Some(v)) => match v.as_str() {
                    Some(s) if options.contains(&s) => None,
                    _ => Some(format!(
                        "{} must be one of: {}",
                        self.label,
                        options.join(", ")
                    )),
                },
            };
            if failure.is_some() {
                return failure;
            }
        }
        None
    }
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn validate(&self, payload: &Value, mode: ValidationMode) -> Result<(), ValidationError> {
        let Some(object) = payload.as_object() else {
            return Err(ValidationError::single(
                "payload",
                format!("{} payload must be a JSON object", self.name),
            ));
        };

        let errors: Vec<FieldError> = self
            .fields
            .iter()
            .filter(|field| mode == ValidationMode::Full || object.contains_key(field.name))
            .filter_map(|field| {
                field.check(object.get(field.name)).map(|message| FieldError {
                    field: field.name.to_string(),
                    message,
                })
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors })
        }
    }
}

pub const RECEIVING_OPTIONS: &[&str] = &["delivery", "pickup", "both"];
pub const ORDER_STATUSES: &[&str] = &[
    "pending",
    "confirmed",
    "processing",
    "shipped",
    "delivered",
    "cancelled",
];
pub const PAYMENT_STATUSES: &[&str] = &["paid", "pending", "failed"];

pub const PRODUCT: FormSchema = FormSchema {
    name: "product",
    fields: &[
        FieldSchema {
            name: "title",
            label: "Product name",
            rules: &[Rule::Required],
        },
        FieldSchema {
            name: "subtitle",
            label: "Product subtitle",
            rules: &[Rule::Required],
        },
        FieldSchema {
            name: "price",
            label: "Price",
            rules: &[Rule::Required, Rule::Min(0.0)],
        },
        FieldSchema {
            name: "stock",
            label: "Stock",
            rules: &[Rule::Required, Rule::Min(0.0)],
        },
        FieldSchema {
            name: "category",
            label: "Category",
            rules: &[Rule::Required],
        },
        FieldSchema {
            name: "receivingOptions",
            label: "Receiving option",
            rules: &[Rule::Required, Rule::OneOf(RECEIVING_OPTIONS)],
        },
        FieldSchema {
            name: "sizes",
            label: "Size",
            rules: &[Rule::Required],
        },
        FieldSchema {
            name: "colors",
            label: "Color",
            rules: &[Rule::Required],
        },
        FieldSchema {
            name: "isActive",
            label: "Status",
            rules: &[Rule::Required],
        },
        FieldSchema {
            name: "description",
            label: "Product description",
            rules: &[Rule::Required],
        },
    ],
};

pub const CATEGORY: FormSchema = FormSchema {
    name: "category",
    fields: &[
        FieldSchema {
            name: "name",
            label: "Category name",
            rules: &[Rule::Required, Rule::MinLength(2)],
        },
        FieldSchema {
            name: "status",
            label: "Status",
            rules: &[Rule::OneOf(&["active", "inactive"])],
        },
    ],
};

/// Orders are only ever updated from the dashboard (status changes).
pub const ORDER: FormSchema = FormSchema {
    name: "order",
    fields: &[
        FieldSchema {
            name: "orderStatus",
            label: "Order status",
            rules: &[Rule::OneOf(ORDER_STATUSES)],
        },
        FieldSchema {
            name: "paymentStatus",
            label: "Payment status",
            rules: &[Rule::OneOf(PAYMENT_STATUSES)],
        },
        FieldSchema {
            name: "contact",
            label: "Customer email",
            rules: &[Rule::Email],
        },
    ],
};

pub const APP_CONFIG: FormSchema = FormSchema {
    name: "app configs",
    fields: &[
        FieldSchema {
            name: "pickupAddress",
            label: "Pickup address",
            rules: &[Rule::Required],
        },
        FieldSchema {
            name: "shippingCost",
            label: "Shipping cost",
            rules: &[Rule::Required, Rule::Min(0.0)],
        },
    ],
};

/// Password strength rules applied to new passwords.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_numbers: bool,
    pub require_special_chars: bool,
}

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_numbers: true,
            require_special_chars: true,
        }
    }
}

impl PasswordPolicy {
    /// Returns the message of the first failed rule.
    pub fn check(&self, password: &str) -> Result<(), String> {
        if password.chars().count() < self.min_length {
            return Err(format!(
                "Password must be at least {} characters long",
                self.min_length
            ));
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err("Password must contain at least one uppercase letter".to_string());
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err("Password must contain at least one lowercase letter".to_string());
        }
        if self.require_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err("Password must contain at least one number".to_string());
        }
        if self.require_special_chars && !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
            return Err("Password must contain at least one special character".to_string());
        }
        Ok(())
    }
}
