/// A protein from a protein database, the identifier and description are only used for reporting.
pub trait Protein {
    /// The identifier, the first word of a FASTA header
    fn identifier(&self) -> &str;
    /// The free text description
    fn description(&self) -> &str;
    /// The amino acid sequence in one letter codes
    fn sequence(&self) -> &str;
}

impl<P: Protein + ?Sized> Protein for &P {
    fn identifier(&self) -> &str {
        (**self).identifier()
    }
    fn description(&self) -> &str {
        (**self).description()
    }
    fn sequence(&self) -> &str {
        (**self).sequence()
    }
}

impl Protein for (&str, &str, &str) {
    fn identifier(&self) -> &str {
        self.0
    }
    fn description(&self) -> &str {
        self.1
    }
    fn sequence(&self) -> &str {
        self.2
    }
}
