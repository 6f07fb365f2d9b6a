use serde::{Deserialize, Deserializer, Serialize};

pub type MovieId = String;

/// Catalog entry. Read-only on the client.
///
/// Serialized in camelCase; the capitalized field names the backend uses
/// (`_id`, `Title`, `Genre`, ...) are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(alias = "_id")]
    pub id: MovieId,
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(default, alias = "Genre")]
    pub genre: Genre,
    #[serde(default, alias = "Director")]
    pub director: Director,
    #[serde(default, alias = "ReleaseDate", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, alias = "ImagePath", skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// Genre, sent by some deployments as a bare name and by others as an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GenreRepr")]
pub struct Genre {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenreRepr {
    Name(String),
    Full {
        #[serde(alias = "Name")]
        name: String,
        #[serde(default, alias = "Description")]
        description: Option<String>,
    },
}

impl From<GenreRepr> for Genre {
    fn from(repr: GenreRepr) -> Self {
        match repr {
            GenreRepr::Name(name) => Genre { name, description: None },
            GenreRepr::Full { name, description } => Genre { name, description },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Director {
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Bio")]
    pub bio: String,
    #[serde(
        default,
        alias = "Birth",
        alias = "birthday",
        deserialize_with = "year_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_year: Option<i32>,
    #[serde(
        default,
        alias = "Death",
        alias = "deathday",
        deserialize_with = "year_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub death_year: Option<i32>,
}

impl Director {
    pub fn is_living(&self) -> bool { self.death_year.is_none() }
}

/// Leading four-digit year of `"1946"`, `"1946-12-18"` or `"1946-12-18T00:00:00Z"`.
/// Anything else (`"N/A"`, empty) is no year.
pub fn parse_year(raw: &str) -> Option<i32> {
    let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return None;
    }
    digits.parse().ok()
}

fn year_opt<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => i32::try_from(n).ok(),
        Some(Raw::Text(s)) => parse_year(&s),
        None => None,
    })
}
