/// Minimal address and domain hierarchy utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Pull the bare address out of a header value such as
    /// `"Fiverr Support" <help@example.com>` or `help@example.com`.
    pub fn extract_address(header_value: &str) -> Option<String> {
        let bracketed = header_value.find('<').and_then(|start| {
            let rest = &header_value[start + 1..];
            rest.find('>').map(|end| &rest[..end])
        });
        let candidate = match bracketed {
            Some(inner) => inner,
            None => header_value
                .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
                .find(|token| token.contains('@'))?,
        };

        let address = candidate
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '<' || c == '>')
            .to_lowercase();

        if address.contains('@') && !address.starts_with('@') && !address.ends_with('@') {
            Some(address)
        } else {
            None
        }
    }

    /// Extract domain from email address or From-style header value
    pub fn extract_domain(email: &str) -> Option<String> {
        let address = Self::extract_address(email)?;
        let domain = address
            .rsplit('@')
            .next()?
            .trim_end_matches('.')
            .to_string();

        if domain.is_empty() {
            None
        } else {
            Some(domain)
        }
    }

    /// Display name part of a From-style header, without quotes.
    pub fn extract_display_name(header_value: &str) -> Option<String> {
        let start = header_value.find('<')?;
        let name = header_value[..start]
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .trim();

        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    /// Check if domain matches any in list (with hierarchy support)
    pub fn matches_domain_list(domain: &str, domain_list: &[String]) -> bool {
        let domain_lower = domain.to_lowercase();

        for pattern in domain_list {
            let pattern_lower = pattern.to_lowercase();

            // Exact match
            if domain_lower == pattern_lower {
                return true;
            }

            // Subdomain match (domain ends with .pattern)
            if domain_lower.ends_with(&format!(".{}", pattern_lower)) {
                return true;
            }
        }

        false
    }

    /// Canonicalize domain (remove www prefix)
    pub fn canonicalize_domain(domain: &str) -> String {
        let domain_lower = domain.to_lowercase();
        if let Some(stripped) = domain_lower.strip_prefix("www.") {
            stripped.to_string()
        } else {
            domain_lower
        }
    }

    /// Same domain, or one is a subdomain of the other
    /// (`mail.example.com` and `example.com`). Sibling subdomains of a shared
    /// parent such as `co.uk` or `github.io` are different organizations.
    pub fn same_organization(a: &str, b: &str) -> bool {
        let a = a.trim_end_matches('.').to_lowercase();
        let b = b.trim_end_matches('.').to_lowercase();
        Self::matches_domain_list(&a, std::slice::from_ref(&b))
            || Self::matches_domain_list(&b, std::slice::from_ref(&a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            DomainUtils::extract_domain("user@example.com"),
            Some("example.com".to_string())
        );
        assert_eq!(
            DomainUtils::extract_domain("\"Fiverr Support Team\" <Help@Fiverr-Help.TK>"),
            Some("fiverr-help.tk".to_string())
        );
        assert_eq!(DomainUtils::extract_domain("invalid"), None);
        assert_eq!(DomainUtils::extract_domain("user@"), None);
    }

    #[test]
    fn test_extract_address_takes_first_sender() {
        // duplicate From headers arrive joined with ", "
        assert_eq!(
            DomainUtils::extract_address("First <a@first.com>, Second <b@second.com>"),
            Some("a@first.com".to_string())
        );
        assert_eq!(
            DomainUtils::extract_address("a@first.com, b@second.com"),
            Some("a@first.com".to_string())
        );
    }

    #[test]
    fn test_extract_display_name() {
        assert_eq!(
            DomainUtils::extract_display_name("\"Fiverr Support Team\" <help@example.com>"),
            Some("Fiverr Support Team".to_string())
        );
        assert_eq!(DomainUtils::extract_display_name("help@example.com"), None);
        assert_eq!(DomainUtils::extract_display_name("<help@example.com>"), None);
    }

    #[test]
    fn test_matches_domain_list() {
        let domains = vec!["example.com".to_string(), "test.org".to_string()];

        assert!(DomainUtils::matches_domain_list("example.com", &domains));
        assert!(DomainUtils::matches_domain_list(
            "mail.example.com",
            &domains
        ));
        assert!(!DomainUtils::matches_domain_list("other.com", &domains));
        assert!(!DomainUtils::matches_domain_list("notexample.com", &domains));
    }

    #[test]
    fn test_canonicalize_domain() {
        assert_eq!(
            DomainUtils::canonicalize_domain("www.example.com"),
            "example.com"
        );
        assert_eq!(
            DomainUtils::canonicalize_domain("example.com"),
            "example.com"
        );
    }

    #[test]
    fn test_same_organization() {
        assert!(DomainUtils::same_organization("mail.example.com", "example.com"));
        assert!(DomainUtils::same_organization("Example.com", "example.com."));
        assert!(!DomainUtils::same_organization("example.com", "example.org"));
        assert!(!DomainUtils::same_organization(
            "designstudio.co.uk",
            "scam-collect.co.uk"
        ));
        assert!(!DomainUtils::same_organization(
            "alice.github.io",
            "mallory.github.io"
        ));
    }
}
