use tracing::trace;

use crate::task::{Priority, Status, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl std::str::FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            Ok(StatusFilter::Only(s.parse()?))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl std::str::FromStr for PriorityFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(PriorityFilter::All)
        } else {
            Ok(PriorityFilter::Only(s.parse()?))
        }
    }
}

/// Client-side view narrowing; never touches backend state.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub search: String,
    pub status: StatusFilter,
    pub priority: PriorityFilter,
}

impl FilterSpec {
    pub fn matches(&self, task: &Task) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = needle.is_empty()
            || task.title.to_lowercase().contains(&needle)
            || task.description.to_lowercase().contains(&needle);
        let matches_status = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => task.status == status,
        };
        let matches_priority = match self.priority {
            PriorityFilter::All => true,
            PriorityFilter::Only(priority) => task.priority == priority,
        };

        let ok = matches_search && matches_status && matches_priority;
        trace!(id = %task.id, ok, "filter evaluated");
        ok
    }

    /// Order-preserving subset of the collection.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}

/// Counts over the full, unfiltered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
}

pub fn stats(tasks: &[Task]) -> Stats {
    let mut out = Stats {
        total: tasks.len(),
        completed: 0,
        in_progress: 0,
        pending: 0,
    };
    for task in tasks {
        match task.status {
            Status::Completed => out.completed += 1,
            Status::InProgress => out.in_progress += 1,
            Status::Pending => out.pending += 1,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{FilterSpec, PriorityFilter, StatusFilter, stats};
    use crate::task::{Priority, Status, Task};

    fn task(id: &str, title: &str, description: &str, status: Status, priority: Priority) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            status,
            priority,
            created_at: Utc::now(),
            file_path: None,
            completed: status == Status::Completed,
        }
    }

    fn sample_collection() -> Vec<Task> {
        vec![
            task(
                "1",
                "Renew Passport",
                "urgent",
                Status::Pending,
                Priority::High,
            ),
            task("2", "Buy milk", "2%", Status::Completed, Priority::Low),
            task(
                "3",
                "Write report",
                "quarterly numbers",
                Status::InProgress,
                Priority::Medium,
            ),
        ]
    }

    #[test]
    fn search_is_case_insensitive_and_matches_both_fields() {
        let tasks = sample_collection();
        for term in ["passport", "RENEW", "urgent"] {
            let spec = FilterSpec {
                search: term.to_string(),
                ..FilterSpec::default()
            };
            let view = spec.apply(&tasks);
            assert_eq!(view.len(), 1, "term {term:?} should match one task");
            assert_eq!(view[0].id, "1");
        }

        let spec = FilterSpec {
            search: "visa".to_string(),
            ..FilterSpec::default()
        };
        assert!(spec.apply(&tasks).is_empty());
    }

    #[test]
    fn identity_filter_returns_collection_unchanged_in_order() {
        let tasks = sample_collection();
        let spec = FilterSpec::default();
        let view = spec.apply(&tasks);

        assert_eq!(view.len(), tasks.len());
        for (seen, expected) in view.iter().zip(tasks.iter()) {
            assert_eq!(seen.id, expected.id);
        }
    }

    #[test]
    fn selectors_narrow_and_combine() {
        let tasks = sample_collection();

        let by_status = FilterSpec {
            status: StatusFilter::Only(Status::Completed),
            ..FilterSpec::default()
        };
        assert_eq!(by_status.apply(&tasks).len(), 1);

        let by_priority = FilterSpec {
            priority: PriorityFilter::Only(Priority::High),
            ..FilterSpec::default()
        };
        assert_eq!(by_priority.apply(&tasks).len(), 1);

        let disjoint = FilterSpec {
            status: StatusFilter::Only(Status::Completed),
            priority: PriorityFilter::Only(Priority::High),
            ..FilterSpec::default()
        };
        assert!(disjoint.apply(&tasks).is_empty());
    }

    #[test]
    fn filtering_preserves_order() {
        let tasks = sample_collection();
        let spec = FilterSpec {
            search: "r".to_string(),
            ..FilterSpec::default()
        };
        let ids: Vec<&str> = spec.apply(&tasks).iter().map(|t| t.id.as_str()).collect();

        let mut expected: Vec<&str> = Vec::new();
        for task in &tasks {
            if spec.matches(task) {
                expected.push(task.id.as_str());
            }
        }
        assert_eq!(ids, expected);
    }

    #[test]
    fn stats_partition_the_collection() {
        let tasks = sample_collection();
        let counts = stats(&tasks);

        assert_eq!(counts.total, 3);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.pending, 1);
        assert_eq!(
            counts.total,
            counts.completed + counts.in_progress + counts.pending
        );
    }

    #[test]
    fn stats_of_empty_collection_are_zero() {
        let counts = stats(&[]);
        assert_eq!(counts.total, 0);
        assert_eq!(counts.completed + counts.in_progress + counts.pending, 0);
    }

    #[test]
    fn selector_parsing() {
        assert_eq!(
            "all".parse::<StatusFilter>().expect("parse"),
            StatusFilter::All
        );
        assert_eq!(
            "completed".parse::<StatusFilter>().expect("parse"),
            StatusFilter::Only(Status::Completed)
        );
        assert!("done".parse::<StatusFilter>().is_err());
        assert_eq!(
            "high".parse::<PriorityFilter>().expect("parse"),
            PriorityFilter::Only(Priority::High)
        );
    }
}
