/// Maps program counters to 1-based source lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: Vec<(usize, usize)>,
}

impl SourceMap {
    /// Entries must be pushed in increasing pc order.
    pub(crate) fn push(&mut self, pc: usize, line: usize) {
        self.entries.push((pc, line));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Line of the instruction that starts at, or contains, `pc`.
    pub fn line_for_pc(&self, pc: usize) -> Option<usize> {
        let index = self.entries.partition_point(|(start, _)| *start <= pc);
        index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|(_, line)| *line)
    }

    pub fn pcs_for_line(&self, line: usize) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|(_, l)| *l == line)
            .map(|(pc, _)| *pc)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.iter().copied()
    }
}
