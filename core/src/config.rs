//! Declarative schema files.
//!
//! A schema can be written in YAML or JSON instead of Rust. Every built-in
//! predicate has a key; custom callables are only available through the
//! builder API.
//!
//! # Example YAML
//!
//! ```yaml
//! command: deploy
//! options:
//!   - name: env
//!     type: choice
//!     choices: [staging, production]
//!   - name: replicas
//!     type: integer
//!     default: 1
//!     allowed_if: env
//!   - name: token
//!     prompt: "API token"
//!     required_if_not: env
//!     prompt_if: env
//! groups:
//!   - require_any: [env, token]
//! ```

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{
    CommandSchema, CommandSchemaBuilder, Constraint, GroupRule, OptionSchema, Predicate, Value,
    ValueType,
};

/// Type name as written in a schema file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeName {
    /// Any text.
    #[default]
    Text,
    /// Integer.
    Integer,
    /// Float.
    Float,
    /// Boolean.
    Boolean,
    /// One of `choices`.
    Choice,
}

/// The six rule keys of one effect kind (`allowed_`, `required_` or `prompt_`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleConfig {
    /// `<kind>_if`: the option is present.
    pub present: Option<String>,
    /// `<kind>_if_not`: the option is absent.
    pub absent: Option<String>,
    /// `<kind>_if_all_of`.
    pub all_of: Option<Vec<String>>,
    /// `<kind>_if_none_of`.
    pub none_of: Option<Vec<String>>,
    /// `<kind>_if_any_of`.
    pub any_of: Option<Vec<String>>,
    /// `<kind>_if_one_of`.
    pub one_of: Option<Vec<String>>,
}

impl RuleConfig {
    /// Predicates in key order: `if`, `if_not`, `if_all_of`, `if_none_of`,
    /// `if_any_of`, `if_one_of`.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(name) = &self.present {
            predicates.push(Predicate::present(name.clone()));
        }
        if let Some(name) = &self.absent {
            predicates.push(Predicate::absent(name.clone()));
        }
        if let Some(names) = &self.all_of {
            predicates.push(Predicate::all_of(names.iter().cloned()));
        }
        if let Some(names) = &self.none_of {
            predicates.push(Predicate::none_of(names.iter().cloned()));
        }
        if let Some(names) = &self.any_of {
            predicates.push(Predicate::any_of(names.iter().cloned()));
        }
        if let Some(names) = &self.one_of {
            predicates.push(Predicate::exactly_one_of(names.iter().cloned()));
        }
        predicates
    }
}

/// One option entry of a schema file.
///
/// Rule keys are flat in the file (`allowed_if`, `required_if_any_of`,
/// `prompt_if_not`, ...); they are grouped per kind here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionConfig {
    /// Option name without `--`.
    pub name: String,
    /// Value type.
    #[serde(default, rename = "type")]
    pub value_type: TypeName,
    /// Accepted values when `type: choice`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Prompt text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Always required.
    #[serde(default)]
    pub required: bool,
    /// Fixed default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// `allowed_if`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_if: Option<String>,
    /// `allowed_if_not`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_if_not: Option<String>,
    /// `allowed_if_all_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_if_all_of: Option<Vec<String>>,
    /// `allowed_if_none_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_if_none_of: Option<Vec<String>>,
    /// `allowed_if_any_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_if_any_of: Option<Vec<String>>,
    /// `allowed_if_one_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_if_one_of: Option<Vec<String>>,

    /// `required_if`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_if: Option<String>,
    /// `required_if_not`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_if_not: Option<String>,
    /// `required_if_all_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_if_all_of: Option<Vec<String>>,
    /// `required_if_none_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_if_none_of: Option<Vec<String>>,
    /// `required_if_any_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_if_any_of: Option<Vec<String>>,
    /// `required_if_one_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_if_one_of: Option<Vec<String>>,

    /// `prompt_if`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_if: Option<String>,
    /// `prompt_if_not`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_if_not: Option<String>,
    /// `prompt_if_all_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_if_all_of: Option<Vec<String>>,
    /// `prompt_if_none_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_if_none_of: Option<Vec<String>>,
    /// `prompt_if_any_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_if_any_of: Option<Vec<String>>,
    /// `prompt_if_one_of`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_if_one_of: Option<Vec<String>>,
}

impl OptionConfig {
    /// The `allowed_*` keys.
    pub fn allowed_rules(&self) -> RuleConfig {
        RuleConfig {
            present: self.allowed_if.clone(),
            absent: self.allowed_if_not.clone(),
            all_of: self.allowed_if_all_of.clone(),
            none_of: self.allowed_if_none_of.clone(),
            any_of: self.allowed_if_any_of.clone(),
            one_of: self.allowed_if_one_of.clone(),
        }
    }

    /// The `required_*` keys.
    pub fn required_rules(&self) -> RuleConfig {
        RuleConfig {
            present: self.required_if.clone(),
            absent: self.required_if_not.clone(),
            all_of: self.required_if_all_of.clone(),
            none_of: self.required_if_none_of.clone(),
            any_of: self.required_if_any_of.clone(),
            one_of: self.required_if_one_of.clone(),
        }
    }

    /// The `prompt_*` keys.
    pub fn prompt_rules(&self) -> RuleConfig {
        RuleConfig {
            present: self.prompt_if.clone(),
            absent: self.prompt_if_not.clone(),
            all_of: self.prompt_if_all_of.clone(),
            none_of: self.prompt_if_none_of.clone(),
            any_of: self.prompt_if_any_of.clone(),
            one_of: self.prompt_if_one_of.clone(),
        }
    }

    fn value_type(&self) -> Result<ValueType, ConfigError> {
        if !self.choices.is_empty() && self.value_type != TypeName::Choice {
            return Err(ConfigError::ChoicesWithoutChoiceType(self.name.clone()));
        }
        Ok(match self.value_type {
            TypeName::Text => ValueType::Text,
            TypeName::Integer => ValueType::Integer,
            TypeName::Float => ValueType::Float,
            TypeName::Boolean => ValueType::Boolean,
            TypeName::Choice => ValueType::Choice(self.choices.clone()),
        })
    }

    /// Converts to an [`OptionSchema`].
    ///
    /// Rules are attached kind by kind (allowed, required, prompt), each in
    /// [`RuleConfig::predicates`] order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ChoicesWithoutChoiceType`] when `choices` is
    /// set on an option that is not a choice.
    pub fn to_option(&self) -> Result<OptionSchema, ConfigError> {
        let mut option = OptionSchema::new(self.name.clone()).with_type(self.value_type()?);
        option.help = self.help.clone();
        option.prompt = self.prompt.clone();
        option.required = self.required;

        if let Some(default) = &self.default {
            option = option.default_value(default.clone());
        }
        for predicate in self.allowed_rules().predicates() {
            option = option.constrain(Constraint::Allowed(predicate));
        }
        for predicate in self.required_rules().predicates() {
            option = option.constrain(Constraint::Required(predicate));
        }
        for predicate in self.prompt_rules().predicates() {
            option = option.constrain(Constraint::Prompt(predicate));
        }
        Ok(option)
    }
}

/// One group entry; exactly one of the three keys must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    /// Every member present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_all: Option<Vec<String>>,
    /// At least one member present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_any: Option<Vec<String>>,
    /// Exactly one member present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_one: Option<Vec<String>>,
}

impl GroupConfig {
    /// The rule and members of this entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGroup`] unless exactly one key is set.
    pub fn rule(&self) -> Result<(GroupRule, &[String]), ConfigError> {
        let set: Vec<(GroupRule, &[String])> = [
            (GroupRule::RequireAll, &self.require_all),
            (GroupRule::RequireAny, &self.require_any),
            (GroupRule::RequireOne, &self.require_one),
        ]
        .into_iter()
        .filter_map(|(rule, members)| members.as_deref().map(|m| (rule, m)))
        .collect();

        match set.as_slice() {
            [single] => Ok(*single),
            [] => Err(ConfigError::InvalidGroup(
                "expected one of require_all, require_any, require_one".to_string(),
            )),
            _ => Err(ConfigError::InvalidGroup(
                "only one of require_all, require_any, require_one may be set".to_string(),
            )),
        }
    }
}

/// A whole schema file.
///
/// # Examples
///
/// ```
/// use constrained_option_core::SchemaConfig;
///
/// let config = SchemaConfig::from_yaml_str(
///     "command: cli\noptions:\n  - name: a\n  - name: b\n    allowed_if: a\n",
/// )
/// .unwrap();
/// let schema = config.into_schema().unwrap();
/// assert_eq!(schema.option_names(), vec!["a", "b"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Command name.
    pub command: String,
    /// Options in declaration order.
    #[serde(default)]
    pub options: Vec<OptionConfig>,
    /// Group constraints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupConfig>,
}

impl SchemaConfig {
    /// Loads a schema file; `.json` files are read as JSON, anything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be read, or
    /// [`ConfigError::YamlError`]/[`ConfigError::JsonError`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(config)
    }

    /// Parses YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::YamlError`] if parsing fails.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::JsonError`] if parsing fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Translates the file into a schema builder without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ChoicesWithoutChoiceType`] for misplaced
    /// `choices` or [`ConfigError::InvalidGroup`] for a malformed group entry.
    pub fn builder(&self) -> Result<CommandSchemaBuilder, ConfigError> {
        let mut builder = CommandSchema::builder(self.command.clone());
        for option in &self.options {
            builder = builder.option(option.to_option()?);
        }
        for group in &self.groups {
            let (rule, members) = group.rule()?;
            builder = builder.group(rule, members.iter().cloned());
        }
        Ok(builder)
    }

    /// Builds and validates the schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGroup`] for a malformed group entry or
    /// [`ConfigError::Schema`] with the first validation error.
    pub fn into_schema(self) -> Result<CommandSchema, ConfigError> {
        Ok(self.builder()?.build()?)
    }
}
