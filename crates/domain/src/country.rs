use serde::{Deserialize, Serialize};

/// Countries a tenant can operate in, using the internal tenant-facing value.
///
/// Admin scopes are keyed by ISO-3166 alpha-2 codes while tenant records store
/// these internal values; the functions in this module translate between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantCountry {
    /// India.
    India,
    /// United Arab Emirates.
    UnitedArabEmirates,
    /// Saudi Arabia.
    SaudiArabia,
    /// Qatar.
    Qatar,
    /// Kuwait.
    Kuwait,
    /// Bahrain.
    Bahrain,
    /// Oman.
    Oman,
    /// United States.
    UnitedStates,
    /// United Kingdom.
    UnitedKingdom,
    /// Canada.
    Canada,
    /// Australia.
    Australia,
    /// Singapore.
    Singapore,
    /// Malaysia.
    Malaysia,
    /// Germany.
    Germany,
    /// France.
    France,
    /// South Africa.
    SouthAfrica,
    /// Nigeria.
    Nigeria,
    /// Kenya.
    Kenya,
    /// Egypt.
    Egypt,
    /// Pakistan.
    Pakistan,
}

impl TenantCountry {
    /// Returns all mapped countries.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[TenantCountry] = &[
            TenantCountry::India,
            TenantCountry::UnitedArabEmirates,
            TenantCountry::SaudiArabia,
            TenantCountry::Qatar,
            TenantCountry::Kuwait,
            TenantCountry::Bahrain,
            TenantCountry::Oman,
            TenantCountry::UnitedStates,
            TenantCountry::UnitedKingdom,
            TenantCountry::Canada,
            TenantCountry::Australia,
            TenantCountry::Singapore,
            TenantCountry::Malaysia,
            TenantCountry::Germany,
            TenantCountry::France,
            TenantCountry::SouthAfrica,
            TenantCountry::Nigeria,
            TenantCountry::Kenya,
            TenantCountry::Egypt,
            TenantCountry::Pakistan,
        ];

        ALL
    }

    /// Returns the internal tenant-facing value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::India => "india",
            Self::UnitedArabEmirates => "united_arab_emirates",
            Self::SaudiArabia => "saudi_arabia",
            Self::Qatar => "qatar",
            Self::Kuwait => "kuwait",
            Self::Bahrain => "bahrain",
            Self::Oman => "oman",
            Self::UnitedStates => "united_states",
            Self::UnitedKingdom => "united_kingdom",
            Self::Canada => "canada",
            Self::Australia => "australia",
            Self::Singapore => "singapore",
            Self::Malaysia => "malaysia",
            Self::Germany => "germany",
            Self::France => "france",
            Self::SouthAfrica => "south_africa",
            Self::Nigeria => "nigeria",
            Self::Kenya => "kenya",
            Self::Egypt => "egypt",
            Self::Pakistan => "pakistan",
        }
    }

    /// Returns the ISO-3166 alpha-2 code.
    #[must_use]
    pub fn iso_code(&self) -> &'static str {
        match self {
            Self::India => "IN",
            Self::UnitedArabEmirates => "AE",
            Self::SaudiArabia => "SA",
            Self::Qatar => "QA",
            Self::Kuwait => "KW",
            Self::Bahrain => "BH",
            Self::Oman => "OM",
            Self::UnitedStates => "US",
            Self::UnitedKingdom => "GB",
            Self::Canada => "CA",
            Self::Australia => "AU",
            Self::Singapore => "SG",
            Self::Malaysia => "MY",
            Self::Germany => "DE",
            Self::France => "FR",
            Self::SouthAfrica => "ZA",
            Self::Nigeria => "NG",
            Self::Kenya => "KE",
            Self::Egypt => "EG",
            Self::Pakistan => "PK",
        }
    }

    /// Looks up a country by ISO code, ignoring ASCII case.
    #[must_use]
    pub fn from_iso(code: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|country| country.iso_code().eq_ignore_ascii_case(code.trim()))
    }

    /// Looks up a country by internal value, ignoring ASCII case.
    #[must_use]
    pub fn from_internal(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|country| country.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// Translates an ISO code to the internal country value.
///
/// Unmapped codes fall back to their lower-cased form.
#[must_use]
pub fn iso_to_internal(code: &str) -> String {
    TenantCountry::from_iso(code)
        .map(|country| country.as_str().to_owned())
        .unwrap_or_else(|| code.to_ascii_lowercase())
}

/// Translates an internal country value to its ISO code.
///
/// Unmapped values fall back to their upper-cased form.
#[must_use]
pub fn internal_to_iso(value: &str) -> String {
    TenantCountry::from_internal(value)
        .map(|country| country.iso_code().to_owned())
        .unwrap_or_else(|| value.to_ascii_uppercase())
}

/// Returns whether an internal tenant country is covered by a list of ISO codes.
///
/// Empty input on either side never matches.
#[must_use]
pub fn is_tenant_country_in_scope<I, S>(internal_value: &str, allowed_iso_codes: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let internal_value = internal_value.trim();
    if internal_value.is_empty() {
        return false;
    }

    allowed_iso_codes
        .into_iter()
        .filter(|code| !code.as_ref().trim().is_empty())
        .map(|code| iso_to_internal(code.as_ref()))
        .any(|allowed| allowed.eq_ignore_ascii_case(internal_value))
}
