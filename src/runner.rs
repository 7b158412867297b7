use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt::{Display, Formatter};

pub const DEFAULT_PHONE_PREFIX: &str = "+88";

/// One race entrant, as stored in the registry sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Runner {
    #[serde(alias = "Full Name", default, deserialize_with = "deserialize_text")]
    pub full_name: String,
    #[serde(alias = "Email", default, deserialize_with = "deserialize_text")]
    pub email: String,
    #[serde(alias = "Phone Number", default, deserialize_with = "deserialize_text")]
    pub phone: String,
    #[serde(
        alias = "Alternative Phone",
        alias = "Alternative Phone Number",
        default,
        deserialize_with = "deserialize_text"
    )]
    pub alternative_phone: String,
    #[serde(alias = "Date of Birth", default, deserialize_with = "deserialize_text")]
    pub date_of_birth: String,
    #[serde(alias = "Address", default, deserialize_with = "deserialize_text")]
    pub address: String,
    #[serde(alias = "Gender", default, deserialize_with = "deserialize_text")]
    pub gender: String,
    #[serde(alias = "T-Shirt Size", default, deserialize_with = "deserialize_text")]
    pub tshirt_size: String,
    #[serde(alias = "Accommodation", default, deserialize_with = "deserialize_text")]
    pub accommodation: String,
    #[serde(alias = "Category", default, deserialize_with = "deserialize_text")]
    pub category: String,
    #[serde(alias = "Payment Number", default, deserialize_with = "deserialize_text")]
    pub payment_number: String,
    #[serde(alias = "Transaction ID", default, deserialize_with = "deserialize_text")]
    pub transaction_id: String,
    #[serde(alias = "Confirmed", default)]
    pub confirmed: Confirmed,
}

impl Runner {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed == Confirmed::Yes
    }

    pub fn category(&self) -> Option<Category> {
        Category::try_from(self.category.as_str()).ok()
    }

    pub fn tshirt_size(&self) -> Option<TShirtSize> {
        TShirtSize::try_from(self.tshirt_size.as_str()).ok()
    }

    /// True when the query is this runner's phone (as given or without the prefix)
    /// or exactly its transaction id.
    pub fn matches(&self, query: &str, prefix: &str) -> bool {
        phone_matches(&self.phone, query, prefix)
            || (!query.is_empty() && self.transaction_id == query)
    }
}

pub fn phone_matches(phone: &str, query: &str, prefix: &str) -> bool {
    if phone.is_empty() || query.is_empty() {
        return false;
    }
    if phone == query {
        return true;
    }
    let phone = strip_phone_prefix(phone, prefix);
    !phone.is_empty() && phone == strip_phone_prefix(query, prefix)
}

pub fn strip_phone_prefix<'a>(phone: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        phone
    } else {
        phone.strip_prefix(prefix).unwrap_or(phone)
    }
}

// sheet cells are not always strings
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(it) => it,
        Value::Bool(it) => it.to_string(),
        Value::Number(it) => it.to_string(),
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirmed {
    Yes,
    #[default]
    No,
}

impl Confirmed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl Display for Confirmed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Confirmed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Confirmed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(true) => Self::Yes,
            Value::String(it) if it.trim().eq_ignore_ascii_case("yes") => Self::Yes,
            Value::String(it) if it.trim().eq_ignore_ascii_case("true") => Self::Yes,
            _ => Self::No,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "21 KM Half Marathon")]
    HalfMarathon,
    #[serde(rename = "10 KM Long Run")]
    LongRun,
    #[serde(rename = "Student 10K")]
    Student,
    #[serde(rename = "Kids 1 KM Fun Run")]
    KidsFunRun,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HalfMarathon => "21 KM Half Marathon",
            Self::LongRun => "10 KM Long Run",
            Self::Student => "Student 10K",
            Self::KidsFunRun => "Kids 1 KM Fun Run",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "21 KM Half Marathon" | "21KM Half Marathon" => Ok(Category::HalfMarathon),
            "10 KM Long Run" | "10KM Long Run" => Ok(Category::LongRun),
            "Student 10K" => Ok(Category::Student),
            "Kids 1 KM Fun Run" | "Kids 1KM Fun Run" => Ok(Category::KidsFunRun),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TShirtSize {
    #[serde(rename = "Xs Kids'")]
    XsKids,
    #[serde(rename = "S Kids'")]
    SKids,
    #[serde(rename = "M Kids'")]
    MKids,
    #[serde(rename = "XS")]
    Xs,
    #[serde(rename = "S")]
    S,
    #[serde(rename = "M")]
    M,
    #[serde(rename = "L")]
    L,
    #[serde(rename = "XL")]
    Xl,
    #[serde(rename = "XXL")]
    Xxl,
    #[serde(rename = "3XL")]
    Xxxl,
    #[serde(rename = "4XL")]
    Xxxxl,
}

impl TShirtSize {
    pub const ALL: [TShirtSize; 11] = [
        TShirtSize::XsKids,
        TShirtSize::SKids,
        TShirtSize::MKids,
        TShirtSize::Xs,
        TShirtSize::S,
        TShirtSize::M,
        TShirtSize::L,
        TShirtSize::Xl,
        TShirtSize::Xxl,
        TShirtSize::Xxxl,
        TShirtSize::Xxxxl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::XsKids => "Xs Kids'",
            Self::SKids => "S Kids'",
            Self::MKids => "M Kids'",
            Self::Xs => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::Xl => "XL",
            Self::Xxl => "XXL",
            Self::Xxxl => "3XL",
            Self::Xxxxl => "4XL",
        }
    }
}

impl TryFrom<&str> for TShirtSize {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|it| it.as_str() == value)
            .ok_or_else(|| format!("unknown t-shirt size: {value}"))
    }
}

impl Display for TShirtSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_sheet_row() {
        let runner = serde_json::from_value::<Runner>(json!({
            "Full Name": "আহমেদ করিম",
            "Email": "ahmed.karim@example.com",
            "Phone Number": 8801712345678_u64,
            "T-Shirt Size": "L",
            "Category": "21 KM Half Marathon",
            "Transaction ID": "TX123456789",
            "Confirmed": "Yes",
            "Accommodation": null,
        }))
        .unwrap();
        assert_eq!("আহমেদ করিম", runner.full_name);
        assert_eq!("8801712345678", runner.phone);
        assert_eq!("", runner.accommodation);
        assert_eq!(Some(Category::HalfMarathon), runner.category());
        assert_eq!(Some(TShirtSize::L), runner.tshirt_size());
        assert!(runner.is_confirmed());
    }

    #[test]
    fn test_serialize_camel_case() {
        let runner = Runner {
            full_name: "সারা বেগম".to_string(),
            tshirt_size: "S Kids'".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&runner).unwrap();
        assert_eq!("সারা বেগম", value["fullName"]);
        assert_eq!("S Kids'", value["tshirtSize"]);
        assert_eq!("No", value["confirmed"]);
    }

    #[test]
    fn test_confirmed_is_lenient() {
        for (value, expected) in [
            (json!("Yes"), Confirmed::Yes),
            (json!(" yes "), Confirmed::Yes),
            (json!(true), Confirmed::Yes),
            (json!("No"), Confirmed::No),
            (json!(""), Confirmed::No),
            (json!(null), Confirmed::No),
        ] {
            assert_eq!(expected, serde_json::from_value::<Confirmed>(value).unwrap());
        }
    }

    #[test]
    fn test_phone_matches() {
        assert!(phone_matches("+8801712345678", "+8801712345678", "+88"));
        assert!(phone_matches("+8801712345678", "01712345678", "+88"));
        assert!(phone_matches("01712345678", "+8801712345678", "+88"));
        assert!(!phone_matches("+8801712345678", "1712345678", "+88"));
        assert!(!phone_matches("+8801712345678", "", "+88"));
        assert!(!phone_matches("+88", "88", "+88"));
        assert!(!phone_matches("", "", "+88"));
    }

    #[test]
    fn test_matches_transaction_id() {
        let runner = Runner {
            phone: "+8801787654321".to_string(),
            transaction_id: "TX987654321".to_string(),
            ..Default::default()
        };
        assert!(runner.matches("TX987654321", DEFAULT_PHONE_PREFIX));
        assert!(!runner.matches("tx987654321", DEFAULT_PHONE_PREFIX));
        assert!(!runner.matches("TX98765432", DEFAULT_PHONE_PREFIX));
    }

    #[test]
    fn test_category_spellings() {
        assert_eq!(Ok(Category::HalfMarathon), Category::try_from("21KM Half Marathon"));
        assert_eq!(Ok(Category::KidsFunRun), Category::try_from("Kids 1 KM Fun Run"));
        assert!(Category::try_from("Marathon").is_err());
    }

    #[test]
    fn test_tshirt_sizes() {
        assert_eq!(Ok(TShirtSize::Xxxl), TShirtSize::try_from("3XL"));
        assert_eq!(Ok(TShirtSize::XsKids), TShirtSize::try_from("Xs Kids'"));
        assert!(TShirtSize::try_from("XXXL").is_err());
        assert_eq!(
            json!("M Kids'"),
            serde_json::to_value(TShirtSize::MKids).unwrap()
        );
    }
}
