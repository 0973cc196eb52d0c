//! Free-text location → [`Region`], by offline table lookup.
//!
//! Checks run in a fixed order and the first hit wins: keyword tokens, then
//! United States, then Canada, then country names, then city names. There is
//! no fallback bucket: an unrecognised location has no region.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Region;

const KEYWORDS: &[(&str, Region)] = &[
    ("remote", Region::Remote),
    ("global", Region::Global),
    ("worldwide", Region::Global),
    ("anywhere", Region::Global),
    ("apac", Region::Asia),
    ("emea", Region::Europe),
    ("americas", Region::NorthAmerica),
    ("latam", Region::LatinAmerica),
    ("uk", Region::Europe),
];

const US_NAMES: &[&str] = &["united states", "united states of america", "usa", "u s a"];

// Checked before the country table: "New Mexico" is a state, not Mexico.
const US_STATE_NAMES: &[&str] = &[
    "alabama", "alaska", "arizona", "arkansas", "california", "colorado", "connecticut",
    "delaware", "florida", "georgia", "hawaii", "idaho", "illinois", "indiana", "iowa", "kansas",
    "kentucky", "louisiana", "maine", "maryland", "massachusetts", "michigan", "minnesota",
    "mississippi", "missouri", "montana", "nebraska", "nevada", "new hampshire", "new jersey",
    "new mexico", "new york", "north carolina", "north dakota", "ohio", "oklahoma", "oregon",
    "pennsylvania", "rhode island", "south carolina", "south dakota", "tennessee", "texas",
    "utah", "vermont", "virginia", "washington", "west virginia", "wisconsin", "wyoming",
    "district of columbia",
];

// Matched case-sensitively so words like "in", "or" and "me" don't count.
const US_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC", "US",
];

const CANADA_NAMES: &[&str] = &[
    "canada",
    "ontario",
    "quebec",
    "british columbia",
    "alberta",
    "manitoba",
    "saskatchewan",
    "nova scotia",
    "new brunswick",
    "newfoundland",
    "prince edward island",
    "yukon",
    "northwest territories",
    "nunavut",
];

const CANADA_PROVINCES: &[&str] = &[
    "ON", "QC", "BC", "AB", "MB", "SK", "NS", "NB", "NL", "PE", "YT", "NT", "NU",
];

const COUNTRIES: &[(&str, Region)] = &[
    ("north america", Region::NorthAmerica),
    // Europe
    ("europe", Region::Europe),
    ("united kingdom", Region::Europe),
    ("great britain", Region::Europe),
    ("england", Region::Europe),
    ("scotland", Region::Europe),
    ("wales", Region::Europe),
    ("northern ireland", Region::Europe),
    ("ireland", Region::Europe),
    ("germany", Region::Europe),
    ("deutschland", Region::Europe),
    ("france", Region::Europe),
    ("spain", Region::Europe),
    ("portugal", Region::Europe),
    ("italy", Region::Europe),
    ("netherlands", Region::Europe),
    ("belgium", Region::Europe),
    ("luxembourg", Region::Europe),
    ("switzerland", Region::Europe),
    ("austria", Region::Europe),
    ("sweden", Region::Europe),
    ("norway", Region::Europe),
    ("denmark", Region::Europe),
    ("finland", Region::Europe),
    ("iceland", Region::Europe),
    ("poland", Region::Europe),
    ("czech republic", Region::Europe),
    ("czechia", Region::Europe),
    ("slovakia", Region::Europe),
    ("hungary", Region::Europe),
    ("romania", Region::Europe),
    ("bulgaria", Region::Europe),
    ("greece", Region::Europe),
    ("croatia", Region::Europe),
    ("serbia", Region::Europe),
    ("slovenia", Region::Europe),
    ("estonia", Region::Europe),
    ("latvia", Region::Europe),
    ("lithuania", Region::Europe),
    ("ukraine", Region::Europe),
    ("moldova", Region::Europe),
    ("albania", Region::Europe),
    ("north macedonia", Region::Europe),
    ("montenegro", Region::Europe),
    ("bosnia", Region::Europe),
    ("cyprus", Region::Europe),
    ("malta", Region::Europe),
    // Asia
    ("asia", Region::Asia),
    ("india", Region::Asia),
    ("china", Region::Asia),
    ("japan", Region::Asia),
    ("south korea", Region::Asia),
    ("korea", Region::Asia),
    ("singapore", Region::Asia),
    ("hong kong", Region::Asia),
    ("taiwan", Region::Asia),
    ("indonesia", Region::Asia),
    ("malaysia", Region::Asia),
    ("thailand", Region::Asia),
    ("philippines", Region::Asia),
    ("vietnam", Region::Asia),
    ("pakistan", Region::Asia),
    ("bangladesh", Region::Asia),
    ("sri lanka", Region::Asia),
    ("nepal", Region::Asia),
    ("kazakhstan", Region::Asia),
    ("uzbekistan", Region::Asia),
    // Oceania
    ("oceania", Region::Oceania),
    ("australia", Region::Oceania),
    ("new zealand", Region::Oceania),
    ("fiji", Region::Oceania),
    ("papua new guinea", Region::Oceania),
    // Latin America
    ("latin america", Region::LatinAmerica),
    ("south america", Region::LatinAmerica),
    ("central america", Region::LatinAmerica),
    ("mexico", Region::LatinAmerica),
    ("brazil", Region::LatinAmerica),
    ("brasil", Region::LatinAmerica),
    ("argentina", Region::LatinAmerica),
    ("chile", Region::LatinAmerica),
    ("colombia", Region::LatinAmerica),
    ("peru", Region::LatinAmerica),
    ("uruguay", Region::LatinAmerica),
    ("paraguay", Region::LatinAmerica),
    ("bolivia", Region::LatinAmerica),
    ("ecuador", Region::LatinAmerica),
    ("venezuela", Region::LatinAmerica),
    ("costa rica", Region::LatinAmerica),
    ("panama", Region::LatinAmerica),
    ("guatemala", Region::LatinAmerica),
    ("honduras", Region::LatinAmerica),
    ("el salvador", Region::LatinAmerica),
    ("nicaragua", Region::LatinAmerica),
    ("dominican republic", Region::LatinAmerica),
    ("puerto rico", Region::LatinAmerica),
    ("jamaica", Region::LatinAmerica),
    // Middle East
    ("middle east", Region::MiddleEast),
    ("israel", Region::MiddleEast),
    ("united arab emirates", Region::MiddleEast),
    ("uae", Region::MiddleEast),
    ("saudi arabia", Region::MiddleEast),
    ("qatar", Region::MiddleEast),
    ("bahrain", Region::MiddleEast),
    ("kuwait", Region::MiddleEast),
    ("oman", Region::MiddleEast),
    ("jordan", Region::MiddleEast),
    ("lebanon", Region::MiddleEast),
    ("turkey", Region::MiddleEast),
    ("turkiye", Region::MiddleEast),
    // Africa
    ("africa", Region::Africa),
    ("south africa", Region::Africa),
    ("nigeria", Region::Africa),
    ("kenya", Region::Africa),
    ("egypt", Region::Africa),
    ("morocco", Region::Africa),
    ("ghana", Region::Africa),
    ("ethiopia", Region::Africa),
    ("rwanda", Region::Africa),
    ("uganda", Region::Africa),
    ("tanzania", Region::Africa),
    ("tunisia", Region::Africa),
    ("algeria", Region::Africa),
    ("senegal", Region::Africa),
];

const CITIES: &[(&str, Region)] = &[
    // North America
    ("new york", Region::NorthAmerica),
    ("nyc", Region::NorthAmerica),
    ("san francisco", Region::NorthAmerica),
    ("bay area", Region::NorthAmerica),
    ("los angeles", Region::NorthAmerica),
    ("seattle", Region::NorthAmerica),
    ("austin", Region::NorthAmerica),
    ("boston", Region::NorthAmerica),
    ("chicago", Region::NorthAmerica),
    ("denver", Region::NorthAmerica),
    ("atlanta", Region::NorthAmerica),
    ("miami", Region::NorthAmerica),
    ("san diego", Region::NorthAmerica),
    ("san jose", Region::NorthAmerica),
    ("palo alto", Region::NorthAmerica),
    ("mountain view", Region::NorthAmerica),
    ("menlo park", Region::NorthAmerica),
    ("toronto", Region::NorthAmerica),
    ("vancouver", Region::NorthAmerica),
    ("montreal", Region::NorthAmerica),
    ("ottawa", Region::NorthAmerica),
    ("calgary", Region::NorthAmerica),
    // Europe
    ("london", Region::Europe),
    ("berlin", Region::Europe),
    ("munich", Region::Europe),
    ("hamburg", Region::Europe),
    ("paris", Region::Europe),
    ("amsterdam", Region::Europe),
    ("dublin", Region::Europe),
    ("madrid", Region::Europe),
    ("barcelona", Region::Europe),
    ("lisbon", Region::Europe),
    ("stockholm", Region::Europe),
    ("copenhagen", Region::Europe),
    ("oslo", Region::Europe),
    ("helsinki", Region::Europe),
    ("zurich", Region::Europe),
    ("geneva", Region::Europe),
    ("vienna", Region::Europe),
    ("prague", Region::Europe),
    ("warsaw", Region::Europe),
    ("krakow", Region::Europe),
    ("budapest", Region::Europe),
    ("bucharest", Region::Europe),
    ("athens", Region::Europe),
    ("milan", Region::Europe),
    ("rome", Region::Europe),
    ("brussels", Region::Europe),
    ("edinburgh", Region::Europe),
    ("manchester", Region::Europe),
    ("tallinn", Region::Europe),
    ("riga", Region::Europe),
    ("vilnius", Region::Europe),
    ("kyiv", Region::Europe),
    // Asia
    ("bangalore", Region::Asia),
    ("bengaluru", Region::Asia),
    ("mumbai", Region::Asia),
    ("delhi", Region::Asia),
    ("hyderabad", Region::Asia),
    ("pune", Region::Asia),
    ("chennai", Region::Asia),
    ("gurgaon", Region::Asia),
    ("gurugram", Region::Asia),
    ("noida", Region::Asia),
    ("tokyo", Region::Asia),
    ("osaka", Region::Asia),
    ("seoul", Region::Asia),
    ("beijing", Region::Asia),
    ("shanghai", Region::Asia),
    ("shenzhen", Region::Asia),
    ("taipei", Region::Asia),
    ("jakarta", Region::Asia),
    ("kuala lumpur", Region::Asia),
    ("bangkok", Region::Asia),
    ("manila", Region::Asia),
    // Oceania
    ("sydney", Region::Oceania),
    ("melbourne", Region::Oceania),
    ("brisbane", Region::Oceania),
    ("perth", Region::Oceania),
    ("adelaide", Region::Oceania),
    ("auckland", Region::Oceania),
    ("wellington", Region::Oceania),
    // Latin America
    ("sao paulo", Region::LatinAmerica),
    ("rio de janeiro", Region::LatinAmerica),
    ("buenos aires", Region::LatinAmerica),
    ("bogota", Region::LatinAmerica),
    ("medellin", Region::LatinAmerica),
    ("santiago", Region::LatinAmerica),
    ("lima", Region::LatinAmerica),
    ("montevideo", Region::LatinAmerica),
    ("guadalajara", Region::LatinAmerica),
    // Middle East
    ("tel aviv", Region::MiddleEast),
    ("dubai", Region::MiddleEast),
    ("abu dhabi", Region::MiddleEast),
    ("riyadh", Region::MiddleEast),
    ("doha", Region::MiddleEast),
    ("istanbul", Region::MiddleEast),
    ("amman", Region::MiddleEast),
    ("beirut", Region::MiddleEast),
    // Africa
    ("lagos", Region::Africa),
    ("nairobi", Region::Africa),
    ("cairo", Region::Africa),
    ("cape town", Region::Africa),
    ("johannesburg", Region::Africa),
    ("accra", Region::Africa),
    ("kigali", Region::Africa),
    ("casablanca", Region::Africa),
];

/// Accent-stripped, whitespace-collapsed words of a location, in both the
/// original case and lower case.
struct Normalized {
    words: Vec<String>,
    padded: String,
}

impl Normalized {
    fn new(location: &str) -> Self {
        let stripped: String = location.nfd().filter(|c| !is_combining_mark(*c)).collect();
        let words: Vec<String> = stripped
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        let padded = format!(" {} ", words.join(" ").to_lowercase());
        Self { words, padded }
    }

    fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whole-word, case-folded phrase match.
    fn has_phrase(&self, phrase: &str) -> bool {
        self.padded.contains(&format!(" {} ", phrase))
    }

    /// Case-sensitive whole-word match against an abbreviation table.
    fn has_code(&self, codes: &[&str]) -> bool {
        self.words.iter().any(|w| codes.contains(&w.as_str()))
    }

    fn lookup(&self, table: &[(&str, Region)]) -> Option<Region> {
        table
            .iter()
            .find(|(phrase, _)| self.has_phrase(phrase))
            .map(|(_, region)| *region)
    }
}

/// Classify a location. Blank or unrecognised input yields `None`.
pub fn region_from_location(location: &str) -> Option<Region> {
    let text = Normalized::new(location);
    if text.is_empty() {
        return None;
    }

    if let Some(region) = text.lookup(KEYWORDS) {
        return Some(region);
    }
    if US_NAMES
        .iter()
        .chain(US_STATE_NAMES)
        .any(|n| text.has_phrase(n))
        || text.has_code(US_STATES)
    {
        return Some(Region::NorthAmerica);
    }
    if CANADA_NAMES.iter().any(|n| text.has_phrase(n)) || text.has_code(CANADA_PROVINCES) {
        return Some(Region::NorthAmerica);
    }
    text.lookup(COUNTRIES).or_else(|| text.lookup(CITIES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_tokens_take_precedence() {
        assert_eq!(region_from_location("Remote - Global"), Some(Region::Remote));
        assert_eq!(region_from_location("Global"), Some(Region::Global));
        assert_eq!(region_from_location("APAC"), Some(Region::Asia));
        assert_eq!(region_from_location("EMEA (Berlin)"), Some(Region::Europe));
        assert_eq!(region_from_location("Americas"), Some(Region::NorthAmerica));
        assert_eq!(region_from_location("London, UK"), Some(Region::Europe));
        assert_eq!(region_from_location("Remote, Canada"), Some(Region::Remote));
    }

    #[test]
    fn detects_united_states() {
        assert_eq!(region_from_location("Austin, TX"), Some(Region::NorthAmerica));
        assert_eq!(region_from_location("New York, NY"), Some(Region::NorthAmerica));
        assert_eq!(region_from_location("United States"), Some(Region::NorthAmerica));
        assert_eq!(region_from_location("Milwaukee, WI"), Some(Region::NorthAmerica));
        // Lower-case "in" is a word, not Indiana.
        assert_eq!(region_from_location("Office in Lisbon"), Some(Region::Europe));
    }

    #[test]
    fn spelled_out_states_beat_country_names() {
        assert_eq!(region_from_location("Albuquerque, New Mexico"), Some(Region::NorthAmerica));
        assert_eq!(region_from_location("Santa Fe, new mexico"), Some(Region::NorthAmerica));
        assert_eq!(region_from_location("Portland, Oregon"), Some(Region::NorthAmerica));
        assert_eq!(region_from_location("Columbus, Ohio"), Some(Region::NorthAmerica));
        // Whole words only: Indiana is not India.
        assert_eq!(region_from_location("Indianapolis"), None);
        assert_eq!(region_from_location("Mexico City"), Some(Region::LatinAmerica));
    }

    #[test]
    fn detects_canada() {
        assert_eq!(region_from_location("Toronto, ON"), Some(Region::NorthAmerica));
        assert_eq!(region_from_location("Québec"), Some(Region::NorthAmerica));
        assert_eq!(region_from_location("British Columbia"), Some(Region::NorthAmerica));
    }

    #[test]
    fn country_then_city_tables() {
        assert_eq!(region_from_location("Berlin, Germany"), Some(Region::Europe));
        assert_eq!(region_from_location("Mexico City"), Some(Region::LatinAmerica));
        assert_eq!(region_from_location("São Paulo"), Some(Region::LatinAmerica));
        assert_eq!(region_from_location("Zürich"), Some(Region::Europe));
        assert_eq!(region_from_location("Bengaluru"), Some(Region::Asia));
        assert_eq!(region_from_location("Sydney"), Some(Region::Oceania));
        assert_eq!(region_from_location("Tel Aviv"), Some(Region::MiddleEast));
        assert_eq!(region_from_location("Lagos, Nigeria"), Some(Region::Africa));
        // Whole words only: "Romania" does not contain the word "oman".
        assert_eq!(region_from_location("Bucharest, Romania"), Some(Region::Europe));
    }

    #[test]
    fn unknown_or_blank_has_no_region() {
        assert_eq!(region_from_location("Ho Chi Minh City"), None);
        assert_eq!(region_from_location("Atlantis"), None);
        assert_eq!(region_from_location(""), None);
        assert_eq!(region_from_location("   \t "), None);
    }
}
