// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operation kind tags and their declared capability hierarchy.
//!
//! Every concrete operation has a stable kind tag. Handler resolution and
//! authority lookup first try the exact kind, then walk the kind's declared
//! supertypes in most-specific-first order. Abstract kinds (`Operation`,
//! `Input`, `Output`, ...) never appear on a real operation instance; they
//! exist so handlers and authority sets can be registered for a whole
//! capability at once.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of operation kinds, concrete and abstract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationKind {
    // Abstract capabilities
    Operation,
    Input,
    Output,
    InputOutput,
    Export,
    GetExport,

    // Composite
    OperationChain,

    // Output conversions
    ToList,
    ToSet,
    ToArray,
    ToSingletonList,
    DiscardOutput,
    Limit,

    // Jobs
    Job,
    GetAllJobDetails,
    GetJobDetails,
    GetJobResults,

    // Result cache
    ExportToResultCache,
    GetResultCacheExport,

    // Named operations
    AddNamedOperation,
    NamedOperation,
    DeleteNamedOperation,
    GetAllNamedOperations,
}

use OperationKind::*;

const INPUT_OUTPUT_SUPERTYPES: &[OperationKind] = &[InputOutput, Input, Output, Operation];
const OUTPUT_SUPERTYPES: &[OperationKind] = &[Output, Operation];

impl OperationKind {
    /// Every kind, in declaration order.
    pub const ALL: &'static [OperationKind] = &[
        Operation,
        Input,
        Output,
        InputOutput,
        Export,
        GetExport,
        OperationChain,
        ToList,
        ToSet,
        ToArray,
        ToSingletonList,
        DiscardOutput,
        Limit,
        Job,
        GetAllJobDetails,
        GetJobDetails,
        GetJobResults,
        ExportToResultCache,
        GetResultCacheExport,
        AddNamedOperation,
        NamedOperation,
        DeleteNamedOperation,
        GetAllNamedOperations,
    ];

    /// Declared supertypes, most specific first. Always ends with
    /// `Operation` unless `self` is `Operation`.
    pub fn supertypes(self) -> &'static [OperationKind] {
        match self {
            Operation => &[],
            Input | Output | Export => &[Operation],
            InputOutput => &[Input, Output, Operation],
            GetExport => OUTPUT_SUPERTYPES,

            OperationChain | ToList | ToSet | ToArray | ToSingletonList | Limit => {
                INPUT_OUTPUT_SUPERTYPES
            }
            DiscardOutput => &[Input, Operation],

            Job | GetAllJobDetails | GetJobDetails => OUTPUT_SUPERTYPES,
            GetJobResults => &[GetExport, Output, Operation],

            ExportToResultCache => &[Export, InputOutput, Input, Output, Operation],
            GetResultCacheExport => &[GetExport, Output, Operation],

            AddNamedOperation | DeleteNamedOperation => &[Operation],
            NamedOperation => INPUT_OUTPUT_SUPERTYPES,
            GetAllNamedOperations => OUTPUT_SUPERTYPES,
        }
    }

    /// The kind itself followed by its supertypes: the lookup order used by
    /// handler resolution and the authoriser.
    pub fn lookup_order(self) -> impl Iterator<Item = OperationKind> {
        std::iter::once(self).chain(self.supertypes().iter().copied())
    }

    /// True for capability kinds that no operation instance carries.
    pub fn is_abstract(self) -> bool {
        matches!(self, Operation | Input | Output | InputOutput | Export | GetExport)
    }

    /// True if values of this kind accept a chained input.
    pub fn accepts_input(self) -> bool {
        self == Input || self.supertypes().contains(&Input)
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation => "Operation",
            Input => "Input",
            Output => "Output",
            InputOutput => "InputOutput",
            Export => "Export",
            GetExport => "GetExport",
            OperationChain => "OperationChain",
            ToList => "ToList",
            ToSet => "ToSet",
            ToArray => "ToArray",
            ToSingletonList => "ToSingletonList",
            DiscardOutput => "DiscardOutput",
            Limit => "Limit",
            Job => "Job",
            GetAllJobDetails => "GetAllJobDetails",
            GetJobDetails => "GetJobDetails",
            GetJobResults => "GetJobResults",
            ExportToResultCache => "ExportToResultCache",
            GetResultCacheExport => "GetResultCacheExport",
            AddNamedOperation => "AddNamedOperation",
            NamedOperation => "NamedOperation",
            DeleteNamedOperation => "DeleteNamedOperation",
            GetAllNamedOperations => "GetAllNamedOperations",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("Unknown operation kind: '{}'", s))
    }
}
