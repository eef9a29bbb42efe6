//! Robots.txt parser implementation
//!
//! Path matching is delegated to the robotstxt crate. Crawl-delay is not part
//! of that matcher, so it is read here from the group that applies to the
//! crawler's product token.

use robotstxt::DefaultMatcher;
use std::time::Duration;
use url::Url;

/// A robots.txt file bound to one crawler product token
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw file body; None allows everything
    content: Option<String>,

    /// Product token used for group matching
    agent: String,

    crawl_delay: Option<Duration>,
}

impl ParsedRobots {
    /// Parses a robots.txt body for the given product token
    pub fn from_content(content: &str, agent: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            agent: agent.to_string(),
            crawl_delay: parse_crawl_delay(content, agent),
        }
    }

    /// Creates a permissive policy, used when the site has no robots.txt
    pub fn allow_all(agent: &str) -> Self {
        Self {
            content: None,
            agent: agent.to_string(),
            crawl_delay: None,
        }
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Checks whether `url` may be fetched
    pub fn is_allowed(&self, url: &Url) -> bool {
        match self.content.as_deref() {
            None | Some("") => true,
            Some(body) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, &self.agent, url.as_str())
            }
        }
    }

    /// Crawl-delay declared for this agent, falling back to the `*` group
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.crawl_delay
    }
}

/// One `User-agent` group and the crawl delay it declares
#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    delay: Option<Duration>,
}

fn parse_crawl_delay(content: &str, agent: &str) -> Option<Duration> {
    let mut groups: Vec<Group> = Vec::new();
    let mut collecting_agents = false;

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_ascii_lowercase().as_str() {
            "user-agent" => {
                // Consecutive agent lines share one group
                if !collecting_agents {
                    groups.push(Group::default());
                    collecting_agents = true;
                }
                if let Some(group) = groups.last_mut() {
                    group.agents.push(value.to_ascii_lowercase());
                }
            }
            "crawl-delay" => {
                collecting_agents = false;
                // Negative, non-finite and overflowing values are dropped
                let delay = value
                    .parse::<f64>()
                    .ok()
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
                if let (Some(group), Some(delay)) = (groups.last_mut(), delay) {
                    group.delay.get_or_insert(delay);
                }
            }
            _ => collecting_agents = false,
        }
    }

    let agent = agent.to_ascii_lowercase();
    let delay_for = |specific: bool| {
        groups
            .iter()
            .filter(|g| {
                g.agents.iter().any(|ua| {
                    if specific {
                        ua != "*" && agent.starts_with(ua.as_str())
                    } else {
                        ua == "*"
                    }
                })
            })
            .find_map(|g| g.delay)
    };

    delay_for(true).or_else(|| delay_for(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "TestBot";

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.com{}", path)).unwrap()
    }

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all(AGENT);
        assert_eq!(robots.agent(), AGENT);
        assert!(robots.is_allowed(&url("/any/path")));
        assert!(robots.is_allowed(&url("/admin")));
        assert_eq!(robots.crawl_delay(), None);
    }

    #[test]
    fn test_disallow_everything() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /", AGENT);
        assert!(!robots.is_allowed(&url("/")));
        assert!(!robots.is_allowed(&url("/page")));
    }

    #[test]
    fn test_disallow_prefix() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /admin", AGENT);
        assert!(robots.is_allowed(&url("/")));
        assert!(!robots.is_allowed(&url("/admin")));
        assert!(!robots.is_allowed(&url("/admin/users?id=1")));
    }

    #[test]
    fn test_allow_overrides_disallow() {
        let content = "User-agent: *\nDisallow: /private\nAllow: /private/public";
        let robots = ParsedRobots::from_content(content, AGENT);
        assert!(!robots.is_allowed(&url("/private")));
        assert!(robots.is_allowed(&url("/private/public")));
    }

    #[test]
    fn test_agent_specific_group() {
        let content = "User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        assert!(!ParsedRobots::from_content(content, AGENT).is_allowed(&url("/page")));
        assert!(ParsedRobots::from_content(content, "OtherBot").is_allowed(&url("/page")));
    }

    #[test]
    fn test_garbage_and_empty_allow_all() {
        let garbage = ParsedRobots::from_content("This is not valid robots.txt {{{", AGENT);
        assert!(garbage.is_allowed(&url("/any")));
        let empty = ParsedRobots::from_content("", AGENT);
        assert!(empty.is_allowed(&url("/any")));
    }

    #[test]
    fn test_crawl_delay_prefers_specific_group() {
        let content = "User-agent: *\nCrawl-delay: 10\n\nUser-agent: testbot\nCrawl-delay: 2.5";
        let robots = ParsedRobots::from_content(content, AGENT);
        assert_eq!(robots.crawl_delay(), Some(Duration::from_millis(2500)));

        let other = ParsedRobots::from_content(content, "OtherBot");
        assert_eq!(other.crawl_delay(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_shared_group() {
        let content = "User-agent: BotA\nUser-agent: TestBot\nDisallow: /x\nCrawl-delay: 3";
        let robots = ParsedRobots::from_content(content, AGENT);
        assert_eq!(robots.crawl_delay(), Some(Duration::from_secs(3)));
        assert_eq!(ParsedRobots::from_content(content, "BotC").crawl_delay(), None);
    }

    #[test]
    fn test_crawl_delay_ignores_bad_values() {
        let content = "User-agent: *\nCrawl-delay: soon\n# Crawl-delay: 4";
        assert_eq!(ParsedRobots::from_content(content, AGENT).crawl_delay(), None);
    }

    #[test]
    fn test_crawl_delay_overflow_is_dropped() {
        for value in ["1e300", "-3", "inf", "NaN"] {
            let content = format!("User-agent: *\nCrawl-delay: {}", value);
            assert_eq!(
                ParsedRobots::from_content(&content, AGENT).crawl_delay(),
                None,
                "{} accepted",
                value
            );
        }

        // A later valid value in the same group still applies
        let content = "User-agent: *\nCrawl-delay: 1e300\nCrawl-delay: 2";
        assert_eq!(
            ParsedRobots::from_content(content, AGENT).crawl_delay(),
            Some(Duration::from_secs(2))
        );
    }
}
