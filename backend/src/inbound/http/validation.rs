//! Message rendering for declarative request validation.
//!
//! Request models declare their rules with `#[derive(validator::Validate)]`.
//! A [`Validator`] runs those rules and renders one message per failing field
//! from a template catalogue:
//!
//! - a per-field override keyed `field.tag` wins,
//! - then a message given on the rule itself,
//! - then the template registered for the tag,
//! - then the fallback template.
//!
//! Templates may use `{tag}`, `{field}`, `{namespace}`, `{value}` and
//! `{param}`. `length` and `range` failures are reported under the `min` or
//! `max` tag depending on which bound was crossed.
//!
//! The catalogue is assembled with a [`ValidatorBuilder`] and frozen by
//! [`ValidatorBuilder::build`]; the resulting [`Validator`] is read-only.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// Template used when neither the field nor the tag has one.
pub const DEFAULT_FALLBACK_TEMPLATE: &str = "{field} failed {tag}";

/// Failing fields keyed by `Model.field`, one message each, in key order.
///
/// `Display` renders the map as a JSON object string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrorSet(BTreeMap<String, String>);

impl ValidationErrorSet {
    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for the field at `path`, if it failed.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Iterate `(path, message)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(path, message)| (path.as_str(), message.as_str()))
    }

    /// The underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl FromIterator<(String, String)> for ValidationErrorSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ValidationErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl std::error::Error for ValidationErrorSet {}

/// Assembles the message catalogue of a [`Validator`].
#[derive(Debug, Clone)]
pub struct ValidatorBuilder {
    tags: HashMap<String, String>,
    fields: HashMap<String, String>,
    fallback: String,
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        let tags = [
            ("required", "{field} is required"),
            ("min", "{field} min {param}"),
            ("max", "{field} max {param}"),
        ]
        .into_iter()
        .map(|(tag, template)| (tag.to_owned(), template.to_owned()))
        .collect();

        Self {
            tags,
            fields: HashMap::new(),
            fallback: DEFAULT_FALLBACK_TEMPLATE.to_owned(),
        }
    }
}

impl ValidatorBuilder {
    /// Start from the default catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the template for `tag`.
    #[must_use]
    pub fn tag_message(mut self, tag: impl Into<String>, template: impl Into<String>) -> Self {
        self.tags.insert(tag.into(), template.into());
        self
    }

    /// Register a template used only for `field` failing `tag`.
    #[must_use]
    pub fn field_message(
        mut self,
        field: &str,
        tag: &str,
        template: impl Into<String>,
    ) -> Self {
        self.fields.insert(format!("{field}.{tag}"), template.into());
        self
    }

    /// Replace the template used for tags without one.
    #[must_use]
    pub fn fallback_message(mut self, template: impl Into<String>) -> Self {
        self.fallback = template.into();
        self
    }

    /// Freeze the catalogue.
    #[must_use]
    pub fn build(self) -> Validator {
        Validator {
            tags: self.tags,
            fields: self.fields,
            fallback: self.fallback,
        }
    }
}

/// Runs declarative validation and renders failures from a frozen catalogue.
#[derive(Debug, Clone)]
pub struct Validator {
    tags: HashMap<String, String>,
    fields: HashMap<String, String>,
    fallback: String,
}

impl Default for Validator {
    fn default() -> Self {
        ValidatorBuilder::default().build()
    }
}

impl Validator {
    /// Validate `model`, qualifying field paths with `namespace`.
    ///
    /// # Errors
    /// A [`ValidationErrorSet`] with one message per failing field.
    pub fn validate<M: Validate>(&self, model: &M, namespace: &str) -> Result<(), ValidationErrorSet> {
        let Err(errors) = model.validate() else {
            return Ok(());
        };
        let mut rendered = BTreeMap::new();
        self.collect(namespace, &errors, &mut rendered);
        Err(ValidationErrorSet(rendered))
    }

    fn collect(&self, path: &str, errors: &ValidationErrors, out: &mut BTreeMap<String, String>) {
        for (field, kind) in errors.errors() {
            let field = field.to_string();
            let qualified = format!("{path}.{field}");
            match kind {
                ValidationErrorsKind::Field(failures) => {
                    if let Some(first) = failures.first() {
                        let message = self.render(&qualified, &field, first);
                        out.insert(qualified, message);
                    }
                }
                ValidationErrorsKind::Struct(inner) => self.collect(&qualified, inner, out),
                ValidationErrorsKind::List(items) => {
                    for (index, inner) in items {
                        self.collect(&format!("{qualified}[{index}]"), inner, out);
                    }
                }
            }
        }
    }

    fn render(&self, namespace: &str, field: &str, error: &ValidationError) -> String {
        let tag = resolve_tag(error);
        let template = self
            .fields
            .get(&format!("{field}.{tag}"))
            .map(String::as_str)
            .or(error.message.as_deref())
            .or_else(|| self.tags.get(&tag).map(String::as_str))
            .unwrap_or(&self.fallback);

        template
            .replace("{tag}", &tag)
            .replace("{field}", field)
            .replace("{namespace}", namespace)
            .replace("{value}", &render_value(error.params.get("value")))
            .replace("{param}", &render_value(rule_param(error, &tag)))
    }
}

/// The tag a failure is reported under.
fn resolve_tag(error: &ValidationError) -> String {
    let code = error.code.as_ref();
    if !matches!(code, "length" | "range") {
        return code.to_owned();
    }
    let min = error.params.get("min");
    let max = error.params.get("max");
    let tag = match (min, max) {
        (Some(_), None) => "min",
        (None, Some(_)) => "max",
        (Some(bound), Some(_)) => {
            if falls_below(code, error.params.get("value"), bound) {
                "min"
            } else {
                "max"
            }
        }
        (None, None) => code,
    };
    tag.to_owned()
}

fn falls_below(code: &str, value: Option<&Value>, bound: &Value) -> bool {
    if code == "length" {
        let length = match value {
            Some(Value::String(text)) => text.chars().count(),
            Some(Value::Array(items)) => items.len(),
            Some(Value::Object(map)) => map.len(),
            _ => return false,
        };
        let Some(minimum) = bound.as_u64() else {
            return false;
        };
        u64::try_from(length).is_ok_and(|length| length < minimum)
    } else {
        match (value.and_then(Value::as_f64), bound.as_f64()) {
            (Some(actual), Some(minimum)) => actual < minimum,
            _ => false,
        }
    }
}

fn rule_param<'a>(error: &'a ValidationError, tag: &str) -> Option<&'a Value> {
    if let Some(param) = error.params.get(tag) {
        return Some(param);
    }
    let mut names: Vec<&str> = error
        .params
        .keys()
        .map(AsRef::as_ref)
        .filter(|name| *name != "value")
        .collect();
    names.sort_unstable();
    names.first().and_then(|name| error.params.get(*name))
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use ::validator::Validate;

    #[derive(Debug, Default, Validate)]
    struct Contact {
        #[validate(required)]
        fullname: Option<String>,
        #[validate(length(min = 3, max = 5))]
        phone_number: Option<String>,
        #[validate(range(min = 1, max = 10))]
        limit: Option<i64>,
        #[validate(email)]
        email: Option<String>,
    }

    fn named() -> Contact {
        Contact {
            fullname: Some("Ann".to_owned()),
            ..Contact::default()
        }
    }

    #[fixture]
    fn catalogue() -> Validator {
        ValidatorBuilder::new().build()
    }

    #[rstest]
    fn valid_models_pass(catalogue: Validator) {
        assert!(catalogue.validate(&named(), "Contact").is_ok());
    }

    #[rstest]
    fn missing_required_field_yields_one_message_naming_it(catalogue: Validator) {
        let errors = catalogue
            .validate(&Contact::default(), "Contact")
            .expect_err("fullname is missing");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("Contact.fullname"), Some("fullname is required"));
    }

    #[rstest]
    #[case(Contact { phone_number: Some("12".to_owned()), ..named() }, "Contact.phone_number", "phone_number min 3")]
    #[case(Contact { phone_number: Some("123456".to_owned()), ..named() }, "Contact.phone_number", "phone_number max 5")]
    #[case(Contact { limit: Some(0), ..named() }, "Contact.limit", "limit min 1")]
    #[case(Contact { limit: Some(11), ..named() }, "Contact.limit", "limit max 10")]
    fn bounds_report_the_crossed_side(
        catalogue: Validator,
        #[case] model: Contact,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        let errors = catalogue.validate(&model, "Contact").expect_err("bound crossed");
        assert_eq!(errors.get(path), Some(expected));
    }

    #[rstest]
    fn field_override_beats_tag_template() {
        let catalogue = ValidatorBuilder::new()
            .field_message("fullname", "required", "tell us who {field} is")
            .build();

        let errors = catalogue
            .validate(&Contact::default(), "Contact")
            .expect_err("fullname is missing");

        assert_eq!(errors.get("Contact.fullname"), Some("tell us who fullname is"));
    }

    #[rstest]
    fn tag_templates_substitute_every_placeholder() {
        let catalogue = ValidatorBuilder::new()
            .tag_message("max", "{namespace}: {value} exceeds {tag} {param}")
            .build();
        let model = Contact {
            phone_number: Some("123456".to_owned()),
            ..named()
        };

        let errors = catalogue.validate(&model, "Contact").expect_err("too long");

        assert_eq!(
            errors.get("Contact.phone_number"),
            Some("Contact.phone_number: 123456 exceeds max 5")
        );
    }

    #[rstest]
    fn unknown_tags_use_the_fallback(catalogue: Validator) {
        let model = Contact {
            email: Some("not-an-address".to_owned()),
            ..named()
        };

        let errors = catalogue.validate(&model, "Contact").expect_err("bad email");

        assert_eq!(errors.get("Contact.email"), Some("email failed email"));
    }

    #[rstest]
    fn every_failing_field_is_reported_in_path_order(catalogue: Validator) {
        let model = Contact {
            phone_number: Some("1".to_owned()),
            limit: Some(99),
            ..Contact::default()
        };

        let errors = catalogue.validate(&model, "Contact").expect_err("three failures");
        let paths: Vec<&str> = errors.iter().map(|(path, _)| path).collect();

        assert_eq!(
            paths,
            vec!["Contact.fullname", "Contact.limit", "Contact.phone_number"]
        );
    }

    #[rstest]
    fn display_is_a_json_object(catalogue: Validator) {
        let errors = catalogue
            .validate(&Contact::default(), "Contact")
            .expect_err("fullname is missing");

        assert_eq!(
            errors.to_string(),
            r#"{"Contact.fullname":"fullname is required"}"#
        );
    }
}
