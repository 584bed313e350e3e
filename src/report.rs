//! Plain-text star history report.

use std::fmt;

use starchart_github::Error;
use starchart_protocol::{MonthlyStars, Repository, StarEvent, monthly_cumulative};

/// Widest bar drawn in the monthly table.
const BAR_WIDTH: u64 = 40;

/// A repository and its cumulative monthly star counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarReport {
    pub repository: Repository,
    pub months: Vec<MonthlyStars>,
    pub events: usize,
}

impl StarReport {
    /// Summarizes a sorted timeline.
    pub fn new(repository: Repository, timeline: &[StarEvent]) -> Self {
        Self {
            repository,
            months: monthly_cumulative(timeline),
            events: timeline.len(),
        }
    }
}

impl fmt::Display for StarReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repo = &self.repository;
        writeln!(f, "{}", repo.full_name)?;
        writeln!(f, "  stars:   {}", repo.stargazers_count)?;
        writeln!(f, "  created: {}", repo.created_at.format("%Y-%m-%d"))?;
        writeln!(f, "  listed:  {} star events", self.events)?;

        let Some(peak) = self.months.last().map(|m| m.total) else {
            return writeln!(f, "  no stars yet");
        };

        writeln!(f)?;
        writeln!(f, "  {:<7}  {:>8}", "month", "total")?;
        for month in &self.months {
            let width = (month.total * BAR_WIDTH).div_ceil(peak.max(1));
            writeln!(
                f,
                "  {:<7}  {:>8}  {}",
                month.month.format("%Y-%m"),
                month.total,
                "#".repeat(usize::try_from(width).unwrap_or(0))
            )?;
        }
        Ok(())
    }
}

/// One-line message for a failed repository, by error category.
pub fn describe(err: &Error) -> String {
    if err.is_rate_limited() {
        "rate limited, please try again later".to_string()
    } else if err.is_too_many_stargazers() {
        format!("{err}; GitHub does not list that many stargazers")
    } else if err.is_upstream_api_failure() {
        format!("GitHub API failure: {err}")
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn star(y: i32, m: u32, d: u32) -> StarEvent {
        StarEvent::new(Utc.with_ymd_and_hms(y, m, d, 8, 0, 0).unwrap())
    }

    fn repo(stars: u64) -> Repository {
        Repository::new(
            "caarlos0/starcharts",
            stars,
            Utc.with_ymd_and_hms(2017, 6, 4, 20, 13, 25).unwrap(),
        )
    }

    #[test]
    fn report_lists_cumulative_months() {
        let timeline = vec![star(2020, 1, 2), star(2020, 1, 9), star(2020, 3, 1), star(2020, 3, 4)];
        let report = StarReport::new(repo(4), &timeline);
        let text = report.to_string();

        assert!(text.starts_with("caarlos0/starcharts\n"));
        assert!(text.contains("created: 2017-06-04"));
        assert!(text.contains("listed:  4 star events"));

        let rows: Vec<&str> = text.lines().filter(|l| l.trim_start().starts_with("2020-")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("2020-01") && rows[0].contains(" 2 "));
        assert!(rows[1].ends_with(&"#".repeat(BAR_WIDTH as usize)));
    }

    #[test]
    fn report_without_stars() {
        let report = StarReport::new(repo(0), &[]);
        assert!(report.to_string().contains("no stars yet"));
    }

    #[test]
    fn describe_by_category() {
        assert_eq!(
            describe(&Error::RateLimited),
            "rate limited, please try again later"
        );
        let too_many = Error::TooManyStargazers {
            stargazers: 90_000,
            pages: 900,
            max_pages: 400,
        };
        assert!(describe(&too_many).contains("does not list"));
        let upstream = Error::UpstreamApi {
            status: 404,
            body: "Not Found".to_string(),
        };
        assert!(describe(&upstream).starts_with("GitHub API failure"));
        assert_eq!(describe(&Error::Cancelled), "operation cancelled");
    }
}
