// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::BellhopError;

/// Declares an option enum whose variants map to a user-facing name and to the
/// single-character code used in Bellhop's option strings.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident {
            $( $variant:ident => ($text:literal, $code:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Character written at this option's position in the `.env` file
            pub fn code(&self) -> char {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            pub fn from_code(code: char) -> Option<$name> {
                match code {
                    $( $code => Some($name::$variant), )+
                    _ => None
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self { $name::$default }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = BellhopError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL.iter()
                    .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
                    .copied()
                    .ok_or_else(|| BellhopError::config(format!(
                        "invalid value `{}` for {}; allowed: {}", s, stringify!($name),
                        $name::ALL.iter().map(|v| v.name()).collect::<Vec<_>>().join(", "))))
            }
        }
    };
}

coded_enum! {
    /// Geometry of the simulation; 2.5-D runs use the 3-D executable
    Dimension, default = TwoD {
        TwoD => ("2D", '2'),
        TwoHalfD => ("2.5D", 'h'),
        ThreeD => ("3D", '3'),
    }
}

impl Dimension {
    /// Number of spatial dimensions the executable works in
    pub fn dim(&self) -> usize {
        match self {
            Dimension::TwoD => 2,
            Dimension::TwoHalfD | Dimension::ThreeD => 3,
        }
    }
}

coded_enum! {
    /// Output requested from a run; the code is the first run-type character
    Task, default = Arrivals {
        Arrivals => ("arrivals", 'A'),
        Eigenrays => ("eigenrays", 'E'),
        Rays => ("rays", 'R'),
    }
}

impl Task {
    /// Extension of the output file Bellhop writes for this task
    pub fn output_extension(&self) -> &'static str {
        match self {
            Task::Arrivals => FileExt::ARR,
            Task::Eigenrays | Task::Rays => FileExt::RAY,
        }
    }
}

coded_enum! {
    SoundSpeedInterp, default = Linear {
        Linear => ("linear", 'C'),
        NLinear => ("nlinear", 'N'),
        Spline => ("spline", 'S'),
        Pchip => ("pchip", 'P'),
        Quadrilateral => ("quadrilateral", 'Q'),
        Hexahedral => ("hexahedral", 'H'),
        Analytic => ("analytic", 'A'),
    }
}

coded_enum! {
    BoundaryCondition, default = Vacuum {
        Vacuum => ("vacuum", 'V'),
        AcoustoElastic => ("acousto-elastic", 'A'),
        Rigid => ("rigid", 'R'),
        FromFile => ("from-file", 'F'),
    }
}

coded_enum! {
    AttenuationUnits, default = DbPerWavelength {
        NepersPerMeter => ("nepers per meter", 'N'),
        FrequencyDependent => ("frequency dependent", 'F'),
        DbPerMeter => ("dB per meter", 'M'),
        DbPerWavelength => ("dB per wavelength", 'W'),
        QualityFactor => ("quality factor", 'Q'),
        LossParameter => ("loss parameter", 'L'),
    }
}

coded_enum! {
    VolumeAttenuation, default = Off {
        Off => ("none", ' '),
        Thorp => ("thorp", 'T'),
        FrancoisGarrison => ("francois-garrison", 'F'),
        Biological => ("biological", 'B'),
    }
}

coded_enum! {
    /// Interpolation of bathymetry and altimetry tables
    CurveInterp, default = Linear {
        Linear => ("linear", 'L'),
        Curvilinear => ("curvilinear", 'C'),
    }
}

coded_enum! {
    BeamType, default = Default {
        Default => ("default", ' '),
        HatCartesian => ("hat-cartesian", 'G'),
        HatRay => ("hat-ray", 'g'),
        GaussianCartesian => ("gaussian-cartesian", 'B'),
        GaussianRay => ("gaussian-ray", 'b'),
        CervenyCartesian => ("cerveny-cartesian", 'C'),
        CervenyRay => ("cerveny-ray", 'R'),
        SimpleGaussian => ("simple-gaussian", 'S'),
    }
}

coded_enum! {
    SourceType, default = Default {
        Default => ("default", ' '),
        Point => ("point", 'R'),
        Line => ("line", 'X'),
    }
}

coded_enum! {
    GridType, default = Default {
        Default => ("default", ' '),
        Rectilinear => ("rectilinear", 'R'),
        Irregular => ("irregular", 'I'),
    }
}

/// File extensions sharing one base name per run
pub struct FileExt;

impl FileExt {
    pub const ENV: &'static str = ".env";
    pub const BTY: &'static str = ".bty";
    pub const ATI: &'static str = ".ati";
    pub const SSP: &'static str = ".ssp";
    pub const SBP: &'static str = ".sbp";
    pub const TRC: &'static str = ".trc";
    pub const BRC: &'static str = ".brc";
    pub const ARR: &'static str = ".arr";
    pub const RAY: &'static str = ".ray";
    pub const PRT: &'static str = ".prt";
    pub const SHD: &'static str = ".shd";
    pub const LOG: &'static str = ".log";

    pub const ALL: [&'static str; 12] = [
        FileExt::ENV, FileExt::BTY, FileExt::ATI, FileExt::SSP,
        FileExt::SBP, FileExt::TRC, FileExt::BRC, FileExt::ARR,
        FileExt::RAY, FileExt::PRT, FileExt::SHD, FileExt::LOG];
}
