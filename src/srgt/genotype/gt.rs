use arrayvec::ArrayVec;

/// A called allele: CAG repeat length paired with its CCG bin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allele {
    pub cag: usize,
    pub ccg: usize,
}

impl Allele {
    pub fn new(cag: usize, ccg: usize) -> Allele {
        Allele { cag, ccg }
    }
}

/// Primary allele first, ordered by read-count dominance
pub type Genotype = ArrayVec<Allele, 2>;

/// Warning flags accumulated over the stages of a sample's genotype call.
/// Flags are only ever raised, never cleared mid-sample.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenotypeFlags {
    pub ccg_zyg_disconnect: bool,
    pub ccg_expansion_skew: bool,
    pub ccg_peak_ambiguous: bool,
    pub ccg_density_ambiguous: bool,
    pub ccg_recall_warning: bool,
    pub ccg_peak_oob: bool,
    pub cag_recall_warning: bool,
    pub cag_consensus_spread_warning: bool,
    pub fpsp_disconnect: bool,
}

impl GenotypeFlags {
    pub fn merge(&mut self, other: &GenotypeFlags) {
        self.ccg_zyg_disconnect |= other.ccg_zyg_disconnect;
        self.ccg_expansion_skew |= other.ccg_expansion_skew;
        self.ccg_peak_ambiguous |= other.ccg_peak_ambiguous;
        self.ccg_density_ambiguous |= other.ccg_density_ambiguous;
        self.ccg_recall_warning |= other.ccg_recall_warning;
        self.ccg_peak_oob |= other.ccg_peak_oob;
        self.cag_recall_warning |= other.cag_recall_warning;
        self.cag_consensus_spread_warning |= other.cag_consensus_spread_warning;
        self.fpsp_disconnect |= other.fpsp_disconnect;
    }
}
