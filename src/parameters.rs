//! Run parameters of the elastic problem, loaded from JSON.
use crate::assembly::local::SaddlePointForm;
use crate::materials::{MixedCoefficients, UniformTraction, YoungPoisson};
use crate::mesh::procedural::BoundaryTags;
use crate::nalgebra::{convert, Point2};
use crate::{BoundaryId, Real};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

/// The rectangular domain `[x1, x2] x [y1, y2]` and its discretization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParameters {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    /// Top faces with center `x <= ice_extent` carry the surface load.
    pub ice_extent: f64,
    pub x_divisions: usize,
    pub y_divisions: usize,
    pub refinements: usize,
}

impl Default for GeometryParameters {
    fn default() -> Self {
        Self {
            x1: 0.0,
            x2: 1.0,
            y1: 0.0,
            y2: 1.0,
            ice_extent: 0.5,
            x_divisions: 1,
            y_divisions: 1,
            refinements: 2,
        }
    }
}

impl GeometryParameters {
    pub fn bottom_left<T: Real>(&self) -> Point2<T> {
        Point2::new(convert(self.x1), convert(self.y1))
    }

    pub fn top_right<T: Real>(&self) -> Point2<T> {
        Point2::new(convert(self.x2), convert(self.y2))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub young: f64,
    pub poisson: f64,
    /// Magnitude of the body force along the vertical axis.
    pub weight: f64,
    /// Scale of the advection-like and divergence-like terms.
    pub scale: f64,
    pub adv_enabled: bool,
    pub div_enabled: bool,
    pub geometry: GeometryParameters,
    pub boundary_tags: BoundaryTags,
    /// Boundary on which all displacement components are fixed.
    pub no_slip: BoundaryId,
    /// Boundary on which only the horizontal displacement is fixed.
    pub v_slip: BoundaryId,
    /// Vertical traction applied on the `ice` boundary.
    pub surface_load: f64,
    /// Either 2 (displacement, pressure) or 3 (one block per component).
    pub n_blocks: usize,
    /// Gauss points per direction.
    pub quadrature_points: usize,
    pub parallel_assembly: bool,
    pub print_matrices: bool,
    pub output_directory: PathBuf,
}

impl Default for Parameters {
    fn default() -> Self {
        let tags = BoundaryTags::default();
        Self {
            young: 1.0,
            poisson: 0.3,
            weight: -1.0,
            scale: 1.0,
            adv_enabled: false,
            div_enabled: false,
            geometry: GeometryParameters::default(),
            boundary_tags: tags,
            no_slip: tags.bottom,
            v_slip: tags.left,
            surface_load: -1.0,
            n_blocks: 2,
            quadrature_points: 3,
            parallel_assembly: false,
            print_matrices: false,
            output_directory: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterError {
    InvalidMaterial { young: f64, poisson: f64 },
    EmptyDomain,
    NoCells,
    InvalidBlockCount(usize),
    NoQuadraturePoints,
    NonFinite(&'static str),
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidMaterial { young, poisson } => write!(
                f,
                "Invalid material: Young's modulus {young} must be positive and \
                 Poisson's ratio {poisson} must lie in (0, 0.5]"
            ),
            Self::EmptyDomain => write!(f, "Domain must satisfy x1 < x2 and y1 < y2"),
            Self::NoCells => write!(f, "Number of divisions in each direction must be positive"),
            Self::InvalidBlockCount(n) => write!(f, "Number of blocks must be 2 or 3, got {n}"),
            Self::NoQuadraturePoints => write!(f, "At least one quadrature point per direction is required"),
            Self::NonFinite(name) => write!(f, "Parameter {name} must be finite"),
        }
    }
}

impl Error for ParameterError {}

impl Parameters {
    pub fn from_json_str(json: &str) -> eyre::Result<Self> {
        let parameters: Self = serde_json::from_str(json).wrap_err("failed to parse parameters")?;
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read parameter file {}", path.display()))?;
        Self::from_json_str(&json).wrap_err_with(|| format!("invalid parameter file {}", path.display()))
    }

    pub fn to_json_string(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(self).wrap_err("failed to serialize parameters")
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        let finite = [
            ("young", self.young),
            ("poisson", self.poisson),
            ("weight", self.weight),
            ("scale", self.scale),
            ("surface_load", self.surface_load),
            ("geometry.x1", self.geometry.x1),
            ("geometry.x2", self.geometry.x2),
            ("geometry.y1", self.geometry.y1),
            ("geometry.y2", self.geometry.y2),
            ("geometry.ice_extent", self.geometry.ice_extent),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ParameterError::NonFinite(*name));
        }
        if self.young <= 0.0 || self.poisson <= 0.0 || self.poisson > 0.5 {
            return Err(ParameterError::InvalidMaterial {
                young: self.young,
                poisson: self.poisson,
            });
        }
        let geometry = &self.geometry;
        if geometry.x1 >= geometry.x2 || geometry.y1 >= geometry.y2 {
            return Err(ParameterError::EmptyDomain);
        }
        if geometry.x_divisions == 0 || geometry.y_divisions == 0 {
            return Err(ParameterError::NoCells);
        }
        if !(self.n_blocks == 2 || self.n_blocks == 3) {
            return Err(ParameterError::InvalidBlockCount(self.n_blocks));
        }
        if self.quadrature_points == 0 {
            return Err(ParameterError::NoQuadraturePoints);
        }
        Ok(())
    }

    pub fn material<T: Real>(&self) -> YoungPoisson<T> {
        YoungPoisson {
            young: convert(self.young),
            poisson: convert(self.poisson),
        }
    }

    pub fn coefficients<T: Real>(&self) -> MixedCoefficients<T> {
        MixedCoefficients::from(self.material::<T>())
    }

    pub fn form<T: Real>(&self) -> SaddlePointForm<T> {
        let flag = |enabled: bool| if enabled { T::one() } else { T::zero() };
        SaddlePointForm {
            weight: convert(self.weight),
            scale: convert(self.scale),
            adv_enabled: flag(self.adv_enabled),
            div_enabled: flag(self.div_enabled),
            surface_load_boundary: self.boundary_tags.ice,
        }
    }

    /// The surface traction on the `ice` boundary for a problem with `displacement_components`
    /// displacement components followed by a pressure component.
    pub fn traction<T: Real>(&self, displacement_components: usize) -> UniformTraction<T> {
        UniformTraction::vertical(displacement_components, convert(self.surface_load))
    }

    /// Name of the generated MATLAB script.
    pub fn matlab_script_name(&self) -> String {
        format!("matrices{}.m", self.poisson)
    }
}
