//! Read models built for the host's panels.

use std::fmt;

use training_defence_core::{
    sell_refund, upgrade_cost, BranchId, TowerSnapshot, MAX_TOWER_LEVEL,
};
use training_defence_system_wave_generation::WaveStats;

/// Composition of the running wave, or of the next one between waves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavePreview {
    /// Whether the previewed wave is already running.
    pub active: bool,
    /// Composition of the previewed wave.
    pub stats: WaveStats,
}

impl fmt::Display for WavePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.active { "Wave" } else { "Next" };
        write!(f, "{prefix} {}: {}", self.stats.wave(), self.stats)
    }
}

/// Branch choice offered to a level-1 tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchOffer {
    /// Offered branch.
    pub branch: BranchId,
    /// Credits the choice costs.
    pub cost: u32,
    /// Whether the current balance covers the cost.
    pub affordable: bool,
}

/// Next progression step of the selected tower.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpgradeOption {
    /// The tower must commit to one of its branches.
    ChooseBranch([BranchOffer; 2]),
    /// The tower can be levelled within its branch.
    Upgrade {
        /// Credits the upgrade costs.
        cost: u32,
        /// Whether the current balance covers the cost.
        affordable: bool,
    },
    /// The tower cannot progress further.
    MaxLevel,
}

/// Panel data for the selected tower.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedSummary {
    /// State of the tower.
    pub tower: TowerSnapshot,
    /// Next progression step.
    pub next: UpgradeOption,
    /// Credits a sale would refund.
    pub refund: u32,
}

impl SelectedSummary {
    pub(crate) fn new(tower: TowerSnapshot, credits: u32) -> Self {
        let next = match upgrade_cost(tower.kind, tower.level) {
            None => UpgradeOption::MaxLevel,
            Some(_) if tower.level >= MAX_TOWER_LEVEL => UpgradeOption::MaxLevel,
            Some(cost) if tower.level == 1 => {
                let offer = |branch: BranchId| BranchOffer {
                    branch,
                    cost,
                    affordable: credits >= cost,
                };
                let [first, second] = tower.kind.branches();
                UpgradeOption::ChooseBranch([offer(first), offer(second)])
            }
            Some(cost) => UpgradeOption::Upgrade {
                cost,
                affordable: credits >= cost,
            },
        };
        let refund = sell_refund(tower.kind, tower.level);
        Self { tower, next, refund }
    }
}

impl fmt::Display for SelectedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} L{}",
            self.tower.kind.profile().label,
            self.tower.level
        )?;
        if let Some(branch) = self.tower.branch {
            write!(f, " {}", branch.label())?;
        }
        match &self.next {
            UpgradeOption::ChooseBranch([first, second]) => write!(
                f,
                " | {} or {} ({})",
                first.branch.label(),
                second.branch.label(),
                first.cost
            )?,
            UpgradeOption::Upgrade { cost, .. } => write!(f, " | upgrade ({cost})")?,
            UpgradeOption::MaxLevel => f.write_str(" | max")?,
        }
        write!(f, " | sell {}", self.refund)
    }
}
