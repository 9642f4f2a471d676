//! The static stage graph: five stages in a fixed order, one routing
//! decision per edge. The whole graph is a pair of match tables, so the
//! routing rules live in one place and the tests can walk them row by row.

use squeeze_types::{RunRecord, StageStatus};

/// One node of the pipeline graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Discovery,
    Eligibility,
    Generation,
    Refinement,
    Publication,
}

impl Stage {
    /// All stages in graph order.
    pub const ORDER: [Stage; 5] = [
        Stage::Discovery,
        Stage::Eligibility,
        Stage::Generation,
        Stage::Refinement,
        Stage::Publication,
    ];

    /// The entry point of every run.
    pub fn entry() -> Stage {
        Stage::Discovery
    }

    /// The static successor, or `None` for the terminal stage.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Discovery => Some(Stage::Eligibility),
            Stage::Eligibility => Some(Stage::Generation),
            Stage::Generation => Some(Stage::Refinement),
            Stage::Refinement => Some(Stage::Publication),
            Stage::Publication => None,
        }
    }

    /// Routing predicate: does the updated record advance past this stage?
    ///
    /// Reads exactly the `status` token. Any token other than the one the
    /// edge expects means "do not advance", including tokens this table
    /// has never heard of.
    pub fn advances(self, record: &RunRecord) -> bool {
        let wanted = match self {
            Stage::Discovery => StageStatus::ResearchDone,
            Stage::Eligibility => StageStatus::Curated,
            Stage::Generation => StageStatus::DraftReady,
            Stage::Refinement => StageStatus::FinalReady,
            // Terminal node: no outgoing edge.
            Stage::Publication => return false,
        };
        record.status == wanted
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Discovery => "discovery",
            Stage::Eligibility => "eligibility",
            Stage::Generation => "generation",
            Stage::Refinement => "refinement",
            Stage::Publication => "publication",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squeeze_types::StageStatus;

    fn record_with(status: StageStatus) -> RunRecord {
        let mut record = RunRecord::new();
        record.status = status;
        record
    }

    #[test]
    fn successor_chain_is_the_fixed_order() {
        assert_eq!(Stage::entry(), Stage::Discovery);
        assert_eq!(Stage::Discovery.next(), Some(Stage::Eligibility));
        assert_eq!(Stage::Eligibility.next(), Some(Stage::Generation));
        assert_eq!(Stage::Generation.next(), Some(Stage::Refinement));
        assert_eq!(Stage::Refinement.next(), Some(Stage::Publication));
        assert_eq!(Stage::Publication.next(), None);
    }

    #[test]
    fn each_edge_advances_on_its_token_only() {
        let table = [
            (Stage::Discovery, StageStatus::ResearchDone),
            (Stage::Eligibility, StageStatus::Curated),
            (Stage::Generation, StageStatus::DraftReady),
            (Stage::Refinement, StageStatus::FinalReady),
        ];

        for (stage, token) in table {
            assert!(
                stage.advances(&record_with(token)),
                "{stage} should advance on {token}"
            );
            // Every other token holds the run at this edge.
            for other in [
                StageStatus::Idle,
                StageStatus::NoPosts,
                StageStatus::Rejected,
                StageStatus::Skip,
                StageStatus::Published,
                StageStatus::WpError,
                StageStatus::Error,
            ] {
                if other != token {
                    assert!(
                        !stage.advances(&record_with(other)),
                        "{stage} must not advance on {other}"
                    );
                }
            }
        }
    }

    #[test]
    fn publication_is_terminal() {
        assert!(!Stage::Publication.advances(&record_with(StageStatus::Published)));
        assert!(!Stage::Publication.advances(&record_with(StageStatus::WpError)));
    }

    #[test]
    fn routing_is_idempotent_on_an_unchanged_record() {
        let record = record_with(StageStatus::ResearchDone);
        let first = Stage::Discovery.advances(&record);
        for _ in 0..10 {
            assert_eq!(Stage::Discovery.advances(&record), first);
        }
    }

    #[test]
    fn routing_ignores_payload_fields() {
        let mut record = record_with(StageStatus::Curated);
        assert!(Stage::Eligibility.advances(&record));
        // worthy is data for the logs, not for routing
        record.worthy = Some(false);
        assert!(Stage::Eligibility.advances(&record));
    }
}
