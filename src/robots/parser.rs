//! Robots.txt rule evaluation
//!
//! Matching is delegated to the robotstxt crate; only the `Crawl-delay`
//! extension, which that crate does not expose, is read here.

use robotstxt::DefaultMatcher;

/// A robots.txt body ready to be queried
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    content: String,
    policy: Policy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    Rules,
    AllowAll,
    DisallowAll,
}

impl ParsedRobots {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            policy: Policy::Rules,
        }
    }

    /// A policy that permits every URL (missing robots.txt)
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            policy: Policy::AllowAll,
        }
    }

    /// A policy that forbids every URL (robots.txt behind 401/403)
    pub fn disallow_all() -> Self {
        Self {
            content: String::new(),
            policy: Policy::DisallowAll,
        }
    }

    /// Checks whether `url` may be fetched by `user_agent`
    ///
    /// `url` may be a full URL or an absolute path.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self.policy {
            Policy::AllowAll => true,
            Policy::DisallowAll => false,
            Policy::Rules if self.content.trim().is_empty() => true,
            Policy::Rules => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
            }
        }
    }

    /// Returns the `Crawl-delay` (seconds) that applies to `user_agent`
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.policy != Policy::Rules {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut group_open = false;
        let mut specific = None;
        let mut wildcard = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    // Consecutive user-agent lines share one group
                    if !group_open {
                        group.clear();
                        group_open = true;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group_open = false;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        specific = specific.or(Some(delay));
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard = wildcard.or(Some(delay));
                    }
                }
                _ => group_open = false,
            }
        }

        specific.or(wildcard)
    }
}
