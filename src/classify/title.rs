//! Job title → [`Category`].
//!
//! Rules are an ordered list of (pattern, category) pairs and the first
//! match wins, so precedence is plain data. Note that the broad software
//! rule sits first: "Security Engineer" or "QA Engineer" land in
//! `software`, not in their more specific buckets.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Category;

const DEFAULT_RULES: &[(Category, &str)] = &[
    (
        Category::Software,
        r"\b(software|engineer|engineering|developer|programmer|swe|front[- ]?end|back[- ]?end|full[- ]?stack|ios|android|mobile|web developer)\b",
    ),
    (
        Category::DataAnalytics,
        r"\b(data|analyst|analytics|scientist|machine learning|ml|ai|business intelligence|bi|statistician)\b",
    ),
    (
        Category::ProductManagement,
        r"\b(product (manager|owner|lead|management|director)|head of product|vp,? product|pm)\b",
    ),
    (
        Category::Design,
        r"\b(design|designer|ux|ui|user experience|user research|researcher|illustrator|creative)\b",
    ),
    (
        Category::DevopsSre,
        r"\b(devops|dev ops|sre|site reliability|infrastructure|platform|cloud|kubernetes|systems administrator|sysadmin)\b",
    ),
    (
        Category::Security,
        r"\b(security|infosec|appsec|cyber|cybersecurity|penetration|pentest|soc analyst)\b",
    ),
    (
        Category::Qa,
        r"\b(qa|quality assurance|test|tester|testing|sdet|quality)\b",
    ),
    (
        Category::ItSupport,
        r"\b(it (support|specialist|administrator|technician|manager)|help ?desk|service desk|desktop support|technical support)\b",
    ),
    (
        Category::Marketing,
        r"\b(marketing|marketer|seo|sem|content|brand|growth|communications|social media|public relations|pr)\b",
    ),
    (
        Category::Sales,
        r"\b(sales|account executive|account manager|business development|bdr|sdr|customer success|partnerships)\b",
    ),
    (
        Category::Operations,
        r"\b(operations|ops|logistics|supply chain|program manager|project manager|office manager|chief of staff|customer support|support)\b",
    ),
    (
        Category::Finance,
        r"\b(finance|financial|accountant|accounting|controller|payroll|tax|treasury|fp&a|bookkeeper|auditor)\b",
    ),
    (
        Category::Hr,
        r"\b(hr|human resources|recruiter|recruiting|talent|people partner|people operations|people ops)\b",
    ),
    (
        Category::Legal,
        r"\b(legal|counsel|attorney|lawyer|paralegal|compliance|privacy)\b",
    ),
];

pub struct TitleClassifier {
    rules: Vec<(Category, Regex)>,
}

impl TitleClassifier {
    /// Build from an ordered list of case-insensitive patterns.
    pub fn new(rules: &[(Category, &str)]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|(category, pattern)| {
                Regex::new(&format!("(?i){}", pattern)).map(|re| (*category, re))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    pub fn standard() -> &'static TitleClassifier {
        static CLASSIFIER: OnceLock<TitleClassifier> = OnceLock::new();
        CLASSIFIER.get_or_init(|| {
            TitleClassifier::new(DEFAULT_RULES).expect("built-in title rules are valid regexes")
        })
    }

    pub fn classify(&self, title: &str) -> Category {
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(&title))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Other)
    }
}

/// Classify a title with the built-in rules.
pub fn categorize(title: &str) -> Category {
    TitleClassifier::standard().classify(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_title_per_category() {
        let cases = [
            ("Senior Backend Software Engineer", Category::Software),
            ("Staff Data Scientist", Category::DataAnalytics),
            ("Senior Product Manager", Category::ProductManagement),
            ("Product Designer", Category::Design),
            ("Site Reliability Lead", Category::DevopsSre),
            ("Head of Security", Category::Security),
            ("QA Lead", Category::Qa),
            ("IT Support Specialist", Category::ItSupport),
            ("Growth Marketing Manager", Category::Marketing),
            ("Enterprise Account Executive", Category::Sales),
            ("Supply Chain Coordinator", Category::Operations),
            ("Senior Accountant", Category::Finance),
            ("Technical Recruiter", Category::Hr),
            ("Associate General Counsel", Category::Legal),
            ("Totally Unrelated Wizard", Category::Other),
        ];
        for (title, expected) in cases {
            assert_eq!(categorize(title), expected, "title: {}", title);
        }
    }

    #[test]
    fn earliest_rule_wins_on_multi_keyword_titles() {
        assert_eq!(categorize("Security Engineer"), Category::Software);
        assert_eq!(categorize("QA Automation Engineer"), Category::Software);
        assert_eq!(categorize("Data Engineer"), Category::Software);
        assert_eq!(categorize("Information Security Analyst"), Category::DataAnalytics);
        assert_eq!(categorize("Marketing Data Analyst"), Category::DataAnalytics);
        assert_eq!(categorize("Sales Operations Manager"), Category::Sales);
        assert_eq!(categorize("Product Designer, Growth"), Category::Design);
    }

    #[test]
    fn matches_whole_words_only() {
        // "rail" must not hit "ai", "sprint" must not hit "pr".
        assert_eq!(categorize("Railway Sprint Coach"), Category::Other);
        assert_eq!(categorize("  senior\tBACKEND   developer "), Category::Software);
        assert_eq!(categorize(""), Category::Other);
    }

    #[test]
    fn custom_rule_order_changes_precedence() {
        let classifier = TitleClassifier::new(&[
            (Category::Security, r"\bsecurity\b"),
            (Category::Software, r"\bengineer\b"),
        ])
        .unwrap();
        assert_eq!(classifier.classify("Security Engineer"), Category::Security);
        assert_eq!(classifier.classify("Backend Engineer"), Category::Software);
        assert_eq!(classifier.classify("Chef"), Category::Other);
    }
}
