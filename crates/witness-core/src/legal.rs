//! Static legal reference data: the constitutional text and leading case law
//! behind each [`ViolationKind`].

use serde::Serialize;

use crate::tags::ViolationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaseCitation {
  pub name:     &'static str,
  pub citation: &'static str,
  pub holding:  &'static str,
}

impl CaseCitation {
  /// The form stored in a violation's `constitutional_basis` when picked.
  pub fn label(&self) -> String { format!("{}, {}", self.name, self.citation) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegalReference {
  pub violation_type:      ViolationKind,
  pub amendment:           &'static str,
  pub constitutional_text: &'static str,
  pub cases:               &'static [CaseCitation],
}

const FOURTH: &str = "The right of the people to be secure in their persons, houses, papers, \
  and effects, against unreasonable searches and seizures, shall not be violated.";
const FIFTH: &str = "No person shall be ... deprived of life, liberty, or property, without due \
  process of law.";
const EIGHTH: &str = "Excessive bail shall not be required, nor excessive fines imposed, nor \
  cruel and unusual punishments inflicted.";
const FIRST: &str = "Congress shall make no law ... abridging the freedom of speech, or of the \
  press; or the right of the people peaceably to assemble, and to petition the Government for \
  a redress of grievances.";
const FOURTEENTH: &str = "No State shall ... deprive any person of life, liberty, or property, \
  without due process of law; nor deny to any person within its jurisdiction the equal \
  protection of the laws.";

static REFERENCES: &[LegalReference] = &[
  LegalReference {
    violation_type:      ViolationKind::ExcessiveForce,
    amendment:           "Fourth Amendment",
    constitutional_text: FOURTH,
    cases:               &[
      CaseCitation {
        name:     "Graham v. Connor",
        citation: "490 U.S. 386 (1989)",
        holding:  "Excessive force claims in an arrest are judged by objective reasonableness.",
      },
      CaseCitation {
        name:     "Tennessee v. Garner",
        citation: "471 U.S. 1 (1985)",
        holding:  "Deadly force against a fleeing suspect who poses no threat is unreasonable.",
      },
      CaseCitation {
        name:     "Kingsley v. Hendrickson",
        citation: "576 U.S. 389 (2015)",
        holding:  "Force against a pretrial detainee is excessive if objectively unreasonable.",
      },
    ],
  },
  LegalReference {
    violation_type:      ViolationKind::MedicalNeglect,
    amendment:           "Eighth Amendment",
    constitutional_text: EIGHTH,
    cases:               &[
      CaseCitation {
        name:     "Estelle v. Gamble",
        citation: "429 U.S. 97 (1976)",
        holding:  "Deliberate indifference to serious medical needs is cruel and unusual.",
      },
      CaseCitation {
        name:     "Farmer v. Brennan",
        citation: "511 U.S. 825 (1994)",
        holding:  "Officials are liable when they know of and disregard an excessive risk.",
      },
    ],
  },
  LegalReference {
    violation_type:      ViolationKind::UnlawfulDetention,
    amendment:           "Fifth Amendment",
    constitutional_text: FIFTH,
    cases:               &[
      CaseCitation {
        name:     "Zadvydas v. Davis",
        citation: "533 U.S. 678 (2001)",
        holding:  "Post-removal-order detention is limited to a period reasonably necessary.",
      },
      CaseCitation {
        name:     "Dunaway v. New York",
        citation: "442 U.S. 200 (1979)",
        holding:  "Custodial detention for interrogation requires probable cause.",
      },
    ],
  },
  LegalReference {
    violation_type:      ViolationKind::DueProcess,
    amendment:           "Fifth Amendment",
    constitutional_text: FIFTH,
    cases:               &[
      CaseCitation {
        name:     "Mathews v. Eldridge",
        citation: "424 U.S. 319 (1976)",
        holding:  "Procedural due process balances private interest, risk of error, and cost.",
      },
      CaseCitation {
        name:     "Reno v. Flores",
        citation: "507 U.S. 292 (1993)",
        holding:  "Aliens are entitled to due process in deportation proceedings.",
      },
    ],
  },
  LegalReference {
    violation_type:      ViolationKind::UnreasonableSearch,
    amendment:           "Fourth Amendment",
    constitutional_text: FOURTH,
    cases:               &[
      CaseCitation {
        name:     "Terry v. Ohio",
        citation: "392 U.S. 1 (1968)",
        holding:  "A stop and frisk requires reasonable suspicion.",
      },
      CaseCitation {
        name:     "Mapp v. Ohio",
        citation: "367 U.S. 643 (1961)",
        holding:  "Evidence from unconstitutional searches is inadmissible in state courts.",
      },
    ],
  },
  LegalReference {
    violation_type:      ViolationKind::FirstAmendmentRetaliation,
    amendment:           "First Amendment",
    constitutional_text: FIRST,
    cases:               &[
      CaseCitation {
        name:     "Nieves v. Bartlett",
        citation: "587 U.S. 391 (2019)",
        holding:  "Retaliatory arrest claims generally require the absence of probable cause.",
      },
      CaseCitation {
        name:     "Hartman v. Moore",
        citation: "547 U.S. 250 (2006)",
        holding:  "Retaliatory prosecution claims require pleading no probable cause.",
      },
    ],
  },
  LegalReference {
    violation_type:      ViolationKind::EqualProtection,
    amendment:           "Fourteenth Amendment",
    constitutional_text: FOURTEENTH,
    cases:               &[
      CaseCitation {
        name:     "Yick Wo v. Hopkins",
        citation: "118 U.S. 356 (1886)",
        holding:  "Equal protection extends to all persons, citizens or not.",
      },
      CaseCitation {
        name:     "Plyler v. Doe",
        citation: "457 U.S. 202 (1982)",
        holding:  "Undocumented persons are within a state's jurisdiction for equal protection.",
      },
    ],
  },
  LegalReference {
    violation_type:      ViolationKind::ConditionsOfConfinement,
    amendment:           "Fourteenth Amendment",
    constitutional_text: FOURTEENTH,
    cases:               &[
      CaseCitation {
        name:     "Bell v. Wolfish",
        citation: "441 U.S. 520 (1979)",
        holding:  "Pretrial detention conditions may not amount to punishment.",
      },
      CaseCitation {
        name:     "Helling v. McKinney",
        citation: "509 U.S. 25 (1993)",
        holding:  "Exposure to conditions posing unreasonable future health risks is actionable.",
      },
    ],
  },
];

/// The legal reference for `kind`.
pub fn reference(kind: ViolationKind) -> &'static LegalReference {
  REFERENCES
    .iter()
    .find(|r| r.violation_type == kind)
    .unwrap_or(&REFERENCES[0])
}

/// How a violation's `constitutional_basis` relates to the reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstitutionalBasis<'a> {
  Case(&'static CaseCitation),
  FreeText(&'a str),
}

pub fn classify_basis(kind: ViolationKind, basis: &str) -> ConstitutionalBasis<'_> {
  let trimmed = basis.trim();
  reference(kind)
    .cases
    .iter()
    .find(|c| c.label() == trimmed || c.name == trimmed)
    .map_or(ConstitutionalBasis::FreeText(trimmed), ConstitutionalBasis::Case)
}
