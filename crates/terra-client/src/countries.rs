//! Typed documents and response shapes for the countries API.

use serde::{Deserialize, Serialize};
use serde_json::json;
use terra_abstraction::Variables;

/// Every country with the fields shown on its card.
pub const GET_COUNTRIES: &str = r"query GetCountries {
  countries {
    code
    name
    emoji
    capital
    currency
    continent {
      name
    }
  }
}";

/// Every continent with its member countries.
pub const GET_CONTINENTS: &str = r"query GetContinents {
  continents {
    code
    name
    countries {
      code
      name
    }
  }
}";

/// Details revealed when a country card is flipped.
pub const GET_COUNTRY_DETAILS: &str = r"query GetCountryDetails($code: ID!) {
  country(code: $code) {
    code
    phone
    languages {
      name
      code
    }
    states {
      name
      code
    }
  }
}";

/// Records that a country card was viewed.
pub const TRACK_COUNTRY_VIEW: &str = r"mutation TrackCountryView($countryCode: String!, $action: String!) {
  trackCountryView(countryCode: $countryCode, action: $action) {
    success
    message
  }
}";

/// Cache tag of a country's detail response.
#[must_use]
pub fn country_details_tag(code: &str) -> String {
    format!("country-details-{}", code)
}

/// Variables for `GET_COUNTRY_DETAILS`.
#[must_use]
pub fn country_details_variables(code: &str) -> Variables {
    let mut variables = Variables::new();
    variables.insert("code".to_string(), json!(code));
    variables
}

/// Variables for `TRACK_COUNTRY_VIEW`.
#[must_use]
pub fn track_country_view_variables(country_code: &str, action: &str) -> Variables {
    let mut variables = Variables::new();
    variables.insert("countryCode".to_string(), json!(country_code));
    variables.insert("action".to_string(), json!(action));
    variables
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinentName {
    pub name: String,
}

/// A country as listed by `GET_COUNTRIES`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub code: String,
    pub name: String,
    pub emoji: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    pub continent: ContinentName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountriesData {
    pub countries: Vec<CountrySummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRef {
    pub code: String,
    pub name: String,
}

/// A continent as listed by `GET_CONTINENTS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continent {
    pub code: String,
    pub name: String,
    pub countries: Vec<CountryRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinentsData {
    pub continents: Vec<Continent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// The detail view of one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryDetails {
    pub code: String,
    pub phone: String,
    pub languages: Vec<Language>,
    pub states: Vec<State>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryDetailsData {
    /// `None` when the code is unknown.
    pub country: Option<CountryDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackCountryViewData {
    pub track_country_view: Option<TrackingResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countries_data_decodes() {
        let data: CountriesData = serde_json::from_value(json!({
            "countries": [{
                "code": "AQ",
                "name": "Antarctica",
                "emoji": "🇦🇶",
                "capital": null,
                "currency": null,
                "continent": { "name": "Antarctica" }
            }]
        }))
        .unwrap();

        assert_eq!(data.countries[0].capital, None);
        assert_eq!(data.countries[0].continent.name, "Antarctica");
    }

    #[test]
    fn test_country_details_unknown_code() {
        let data: CountryDetailsData = serde_json::from_value(json!({ "country": null })).unwrap();
        assert!(data.country.is_none());
    }

    #[test]
    fn test_track_country_view_is_camel_case() {
        let data: TrackCountryViewData = serde_json::from_value(json!({
            "trackCountryView": { "success": true, "message": "ok" }
        }))
        .unwrap();
        assert!(data.track_country_view.unwrap().success);
    }

    #[test]
    fn test_variables_helpers() {
        assert_eq!(country_details_variables("NL")["code"], "NL");
        let tracking = track_country_view_variables("NL", "flip");
        assert_eq!(tracking["countryCode"], "NL");
        assert_eq!(tracking["action"], "flip");
        assert_eq!(country_details_tag("NL"), "country-details-NL");
    }
}
