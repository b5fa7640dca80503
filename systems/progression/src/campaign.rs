use serde::{Deserialize, Serialize};
use tracing::info;
use training_defence_core::MapId;

/// One step of the campaign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CampaignStage {
    /// Map the stage must be played on.
    pub map: MapId,
    /// Wave number that completes the stage.
    pub target_wave: u32,
    /// Credits granted on completion.
    pub credits: u32,
    /// Lives granted on completion.
    pub lives: u32,
}

/// Ordered campaign stages.
pub const CAMPAIGN_STAGES: [CampaignStage; 4] = [
    CampaignStage {
        map: MapId::Core,
        target_wave: 5,
        credits: 60,
        lives: 2,
    },
    CampaignStage {
        map: MapId::Splice,
        target_wave: 8,
        credits: 90,
        lives: 3,
    },
    CampaignStage {
        map: MapId::Lattice,
        target_wave: 10,
        credits: 120,
        lives: 3,
    },
    CampaignStage {
        map: MapId::Core,
        target_wave: 15,
        credits: 200,
        lives: 5,
    },
];

/// Reward handed out when a stage completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageReward {
    /// One-based number of the completed stage.
    pub stage: usize,
    /// Credits to grant.
    pub credits: u32,
    /// Lives to grant.
    pub lives: u32,
}

/// Progress summary for display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CampaignProgress {
    /// One-based number of the active stage, or the stage count once finished.
    pub stage: usize,
    /// Map of the active stage, `None` once the campaign is finished.
    pub map: Option<MapId>,
    /// Target wave of the active stage.
    pub target_wave: u32,
    /// Completion fraction in `[0, 1]` for the active map and wave.
    pub fraction: f32,
}

/// Persisted campaign position. The stage index never decreases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    #[serde(default)]
    stage: usize,
}

impl Campaign {
    /// Starts the campaign at its first stage.
    #[must_use]
    pub const fn new() -> Self {
        Self { stage: 0 }
    }

    /// Zero-based index of the unlocked frontier.
    #[must_use]
    pub fn stage_index(&self) -> usize {
        self.stage.min(CAMPAIGN_STAGES.len())
    }

    /// Stage currently being played for, `None` once every stage is done.
    #[must_use]
    pub fn current(&self) -> Option<&'static CampaignStage> {
        CAMPAIGN_STAGES.get(self.stage)
    }

    /// Reports whether every stage has been completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.stage >= CAMPAIGN_STAGES.len()
    }

    /// Reports whether a map is bound to a stage at or below the frontier.
    #[must_use]
    pub fn is_map_unlocked(&self, map: MapId) -> bool {
        CAMPAIGN_STAGES
            .iter()
            .take(self.stage_index() + 1)
            .any(|stage| stage.map == map)
    }

    /// Summarises progress towards the active stage.
    #[must_use]
    pub fn progress(&self, map: MapId, wave: u32) -> CampaignProgress {
        match self.current() {
            Some(stage) => {
                let fraction = if stage.map == map && stage.target_wave > 0 {
                    (wave as f32 / stage.target_wave as f32).min(1.0)
                } else {
                    0.0
                };
                CampaignProgress {
                    stage: self.stage + 1,
                    map: Some(stage.map),
                    target_wave: stage.target_wave,
                    fraction,
                }
            }
            None => CampaignProgress {
                stage: CAMPAIGN_STAGES.len(),
                map: None,
                target_wave: 0,
                fraction: 1.0,
            },
        }
    }

    /// Completes the active stage when `wave` reached its target on its map.
    ///
    /// At most one stage completes per call; the reward is returned exactly
    /// once because the frontier moves past the completed stage.
    pub fn evaluate(&mut self, map: MapId, wave: u32) -> Option<StageReward> {
        let stage = self.current()?;
        if stage.map != map || wave < stage.target_wave {
            return None;
        }

        self.stage += 1;
        info!(
            stage = self.stage,
            map = map.as_str(),
            wave,
            "campaign stage completed"
        );
        Some(StageReward {
            stage: self.stage,
            credits: stage.credits,
            lives: stage.lives,
        })
    }
}
