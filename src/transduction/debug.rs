//! Consistency checks and dumps.

use log::debug;

use super::{PfState, Transduction};
use crate::engine::Engine;

impl<E: Engine> Transduction<E> {
    /// Whether every primary output still matches its original function
    /// outside of its don't-care condition.
    pub fn verify(&self) -> bool {
        self.pos.iter().enumerate().all(|(j, &po)| {
            let diff = self.fanin_func(po, 0).xor(&self.po_funcs[j]);
            diff.and(&self.cond(po, 0).not()).is_const0()
        })
    }

    /// Rebuilds every gate from scratch and reports whether the stored
    /// functions were up to date.
    pub fn build_debug(&mut self) -> bool {
        let funcs = self.funcs.clone();
        for &i in &self.objs {
            self.updates[i] = true;
        }
        self.build(false);
        self.objs.iter().all(|&i| funcs[i] == self.funcs[i])
    }

    /// Recomputes compatible permissible functions from scratch and reports
    /// whether the stored ones were up to date.
    pub fn cspf_debug(&mut self) -> bool {
        let perms = self.perms.clone();
        let conds = self.conds.clone();
        self.state = PfState::None;
        self.cspf_with(false, None, None);
        self.objs
            .iter()
            .all(|&i| perms[i] == self.perms[i] && conds[i] == self.conds[i])
    }

    /// Recomputes maximum permissible functions from scratch and reports
    /// whether the stored ones were up to date.
    pub fn mspf_debug(&mut self) -> bool {
        let perms = self.perms.clone();
        let conds = self.conds.clone();
        self.state = PfState::None;
        self.mspf_with(false, None, None);
        self.objs
            .iter()
            .all(|&i| perms[i] == self.perms[i] && conds[i] == self.conds[i])
    }

    /// Logs every gate with its fanins, then every primary output.
    pub fn print_objs(&self) {
        for &i in &self.objs {
            let fanins: Vec<String> = self.fanins[i].iter().map(|f| f.to_string()).collect();
            if self.level_aware {
                debug!(
                    "gate {:5}: [{}] level = {}, slack = {}",
                    i,
                    fanins.join(", "),
                    self.levels[i],
                    self.slacks[i]
                );
            } else {
                debug!("gate {:5}: [{}]", i, fanins.join(", "));
            }
        }
        for (j, &po) in self.pos.iter().enumerate() {
            debug!("po {:5}: {}", j, self.fanins[po][0]);
        }
    }
}
