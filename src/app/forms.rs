//! Form schemas and validation.
//!
//! Each form is a static, ordered list of typed fields. Handlers validate
//! raw submissions against them and render the same schema back into page
//! contexts, so the field set a page advertises is the field set it accepts.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::domain::group::Group;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const MSG_INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const MSG_FILE_TOO_LARGE: &str = "The uploaded file is too large.";
pub const MSG_INVALID_USERNAME: &str = "Enter a valid username. \
    This value may contain only letters, numbers, and @/./+/-/_ characters.";

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum FieldKind {
    CharField { max_length: Option<usize> },
    ModelChoiceField,
    ImageField,
    PasswordField,
    EmailField,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    pub help_text: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct FormSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// An unbound view of this form, ready to be filled and rendered.
    pub fn view(&'static self) -> FormView {
        FormView {
            schema: self,
            values: Vec::new(),
            choices: Vec::new(),
            errors: FormErrors::default(),
        }
    }
}

pub static POST_FORM: FormSchema = FormSchema {
    name: "post",
    fields: &[
        FieldSpec {
            name: "text",
            label: "Post text",
            kind: FieldKind::CharField { max_length: None },
            required: true,
            help_text: "Text of the new post",
        },
        FieldSpec {
            name: "group",
            label: "Group",
            kind: FieldKind::ModelChoiceField,
            required: false,
            help_text: "Group the post will belong to",
        },
        FieldSpec {
            name: "image",
            label: "Image",
            kind: FieldKind::ImageField,
            required: false,
            help_text: "Picture attached to the post",
        },
    ],
};

pub static COMMENT_FORM: FormSchema = FormSchema {
    name: "comment",
    fields: &[FieldSpec {
        name: "text",
        label: "Comment",
        kind: FieldKind::CharField { max_length: None },
        required: true,
        help_text: "Text of the comment",
    }],
};

pub static LOGIN_FORM: FormSchema = FormSchema {
    name: "login",
    fields: &[
        FieldSpec {
            name: "username",
            label: "Username",
            kind: FieldKind::CharField {
                max_length: Some(MAX_USERNAME_LEN),
            },
            required: true,
            help_text: "",
        },
        FieldSpec {
            name: "password",
            label: "Password",
            kind: FieldKind::PasswordField,
            required: true,
            help_text: "",
        },
    ],
};

pub static SIGNUP_FORM: FormSchema = FormSchema {
    name: "signup",
    fields: &[
        FieldSpec {
            name: "username",
            label: "Username",
            kind: FieldKind::CharField {
                max_length: Some(MAX_USERNAME_LEN),
            },
            required: true,
            help_text: "150 characters or fewer. Letters, digits and @/./+/-/_ only.",
        },
        FieldSpec {
            name: "email",
            label: "Email address",
            kind: FieldKind::EmailField,
            required: false,
            help_text: "",
        },
        FieldSpec {
            name: "password",
            label: "Password",
            kind: FieldKind::PasswordField,
            required: true,
            help_text: "At least 8 characters.",
        },
    ],
};

/// Validation messages per field, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field.to_string(), vec![message])),
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, messages) in &self.entries {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl From<&Group> for Choice {
    fn from(group: &Group) -> Self {
        Self {
            value: group.id.to_string(),
            label: group.title.clone(),
        }
    }
}

/// A form as it appears in a page context: schema, bound values, choices
/// and errors.
#[derive(Debug, Clone)]
pub struct FormView {
    schema: &'static FormSchema,
    values: Vec<(&'static str, String)>,
    choices: Vec<(&'static str, Vec<Choice>)>,
    errors: FormErrors,
}

impl FormView {
    pub fn with_value(mut self, field: &str, value: impl Into<String>) -> Self {
        if let Some(spec) = self.schema.field(field) {
            // passwords are never echoed back
            if spec.kind != FieldKind::PasswordField {
                self.values.push((spec.name, value.into()));
            }
        }
        self
    }

    pub fn with_choices(mut self, field: &str, choices: Vec<Choice>) -> Self {
        if let Some(spec) = self.schema.field(field) {
            self.choices.push((spec.name, choices));
        }
        self
    }

    pub fn with_errors(mut self, errors: FormErrors) -> Self {
        self.errors = errors;
        self
    }
}

#[derive(Serialize)]
struct RenderedField<'a> {
    #[serde(flatten)]
    spec: &'a FieldSpec,
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    choices: Option<&'a [Choice]>,
}

impl Serialize for FormView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields: Vec<RenderedField<'_>> = self
            .schema
            .fields
            .iter()
            .map(|spec| RenderedField {
                spec,
                value: self
                    .values
                    .iter()
                    .find(|(name, _)| *name == spec.name)
                    .map(|(_, value)| value.as_str()),
                choices: self
                    .choices
                    .iter()
                    .find(|(name, _)| *name == spec.name)
                    .map(|(_, choices)| choices.as_slice()),
            })
            .collect();

        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("name", self.schema.name)?;
        map.serialize_entry("fields", &fields)?;
        map.serialize_entry("errors", &self.errors)?;
        map.serialize_entry("is_bound", &!self.values.is_empty())?;
        map.end()
    }
}

/// A file part from a multipart submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: bytes::Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct PostSubmission {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<UploadedFile>,
}

#[derive(Debug, Clone)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<UploadedFile>,
}

pub fn validate_post(
    submission: &PostSubmission,
    groups: &[Group],
    max_image_bytes: usize,
) -> Result<CleanPost, FormErrors> {
    let mut errors = FormErrors::default();

    let text = clean_required_text(submission.text.as_deref(), "text", None, &mut errors);

    let group_id = match submission.group.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) if groups.iter().any(|group| group.id == id) => Some(id),
            _ => {
                errors.add("group", MSG_INVALID_CHOICE);
                None
            }
        },
    };

    let image = match &submission.image {
        // an untouched file input still sends an empty part
        Some(upload) if upload.data.is_empty() && upload.filename.is_empty() => None,
        Some(upload) => {
            if upload.data.len() > max_image_bytes {
                errors.add("image", MSG_FILE_TOO_LARGE);
                None
            } else if image::load_from_memory(&upload.data).is_err() {
                errors.add("image", MSG_INVALID_IMAGE);
                None
            } else {
                Some(upload.clone())
            }
        }
        None => None,
    };

    errors.into_result(CleanPost {
        text,
        group_id,
        image,
    })
}

pub fn validate_comment(text: Option<&str>) -> Result<String, FormErrors> {
    let mut errors = FormErrors::default();
    let text = clean_required_text(text, "text", None, &mut errors);
    errors.into_result(text)
}

#[derive(Debug, Clone)]
pub struct CleanSignup {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn validate_signup(
    username: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<CleanSignup, FormErrors> {
    let mut errors = FormErrors::default();

    let username = clean_required_text(username, "username", Some(MAX_USERNAME_LEN), &mut errors);
    if !username.is_empty() && !username.chars().all(is_username_char) {
        errors.add(
            "username",
            MSG_INVALID_USERNAME,
        );
    }

    let email = email.map(str::trim).unwrap_or_default().to_string();
    if !email.is_empty() && !is_plausible_email(&email) {
        errors.add("email", "Enter a valid email address.");
    }

    let password = password.unwrap_or_default().to_string();
    if password.is_empty() {
        errors.add("password", MSG_REQUIRED);
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!(
                "This password is too short. It must contain at least {} characters.",
                MIN_PASSWORD_LEN
            ),
        );
    }

    errors.into_result(CleanSignup {
        username,
        email,
        password,
    })
}

pub fn validate_login(
    username: Option<&str>,
    password: Option<&str>,
) -> Result<(String, String), FormErrors> {
    let mut errors = FormErrors::default();
    let username = clean_required_text(username, "username", Some(MAX_USERNAME_LEN), &mut errors);
    let password = password.unwrap_or_default().to_string();
    if password.is_empty() {
        errors.add("password", MSG_REQUIRED);
    }
    errors.into_result((username, password))
}

fn clean_required_text(
    raw: Option<&str>,
    field: &str,
    max_length: Option<usize>,
    errors: &mut FormErrors,
) -> String {
    let value = raw.map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        errors.add(field, MSG_REQUIRED);
        return value;
    }
    if let Some(max) = max_length {
        let len = value.chars().count();
        if len > max {
            errors.add(
                field,
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max, len
                ),
            );
        }
    }
    value
}

fn is_username_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_')
}

fn is_plausible_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
