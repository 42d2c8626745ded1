//! Animation clips, channels and samplers

use glam::{Quat, Vec3};
use serde::Deserialize;

use super::interpolation::{find_bracket, hermite};
use crate::error::{GltfError, Result};
use crate::node::Node;

/// Keyframe interpolation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Interpolation {
    #[default]
    #[serde(rename = "LINEAR")]
    Linear,
    #[serde(rename = "STEP")]
    Step,
    /// Cubic Hermite spline with per-keyframe in/out tangents
    #[serde(rename = "CUBICSPLINE")]
    CubicSpline,
}

/// Node property an animation channel writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetProperty {
    Translation,
    Rotation,
    Scale,
}

impl TargetProperty {
    /// Number of floats per keyframe value
    pub fn components(self) -> usize {
        match self {
            Self::Translation | Self::Scale => 3,
            Self::Rotation => 4,
        }
    }

    /// Value the property holds when a sampler has no keyframes
    pub fn default_value(self) -> PropertyValue {
        match self {
            Self::Translation => PropertyValue::Translation(Vec3::ZERO),
            Self::Rotation => PropertyValue::Rotation(Quat::IDENTITY),
            Self::Scale => PropertyValue::Scale(Vec3::ONE),
        }
    }

    fn value_from(self, v: &[f32]) -> PropertyValue {
        match self {
            Self::Translation => PropertyValue::Translation(Vec3::from_slice(v)),
            Self::Rotation => PropertyValue::Rotation(Quat::from_slice(v)),
            Self::Scale => PropertyValue::Scale(Vec3::from_slice(v)),
        }
    }
}

/// An interpolated value ready to be written onto a [`Node`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

/// Keyframe times and values plus the interpolation between them
#[derive(Debug, Clone)]
pub struct AnimationSampler {
    input: Vec<f32>,
    output: Vec<f32>,
    interpolation: Interpolation,
    components: usize,
}

impl AnimationSampler {
    /// Create a sampler
    ///
    /// `output` holds `components` floats per keyframe, or three such groups
    /// (in-tangent, value, out-tangent) per keyframe for cubic splines.
    pub fn new(
        input: Vec<f32>,
        output: Vec<f32>,
        interpolation: Interpolation,
        components: usize,
    ) -> Result<Self> {
        if input.windows(2).any(|w| w[1] < w[0]) {
            return Err(GltfError::ValidationError(
                "sampler input times are not non-decreasing".to_string(),
            ));
        }
        if input.iter().any(|t| !t.is_finite()) {
            return Err(GltfError::ValidationError(
                "sampler input times contain non-finite values".to_string(),
            ));
        }

        let groups = match interpolation {
            Interpolation::CubicSpline => 3,
            Interpolation::Linear | Interpolation::Step => 1,
        };
        let expected = input.len() * components * groups;
        if output.len() != expected {
            return Err(GltfError::ValidationError(format!(
                "sampler has {} output values, expected {} ({} keyframes x {} components x {})",
                output.len(),
                expected,
                input.len(),
                components,
                groups
            )));
        }

        Ok(Self {
            input,
            output,
            interpolation,
            components,
        })
    }

    pub fn input(&self) -> &[f32] {
        &self.input
    }

    pub fn output(&self) -> &[f32] {
        &self.output
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Floats per keyframe value
    pub fn components(&self) -> usize {
        self.components
    }

    /// Timestamp of the last keyframe, 0 without keyframes
    pub fn last_time(&self) -> f32 {
        self.input.last().copied().unwrap_or(0.0)
    }

    /// Keyframe value slice (the middle group for cubic splines)
    fn value(&self, key: usize) -> &[f32] {
        self.group(key, 1)
    }

    /// `group` 0 = in-tangent, 1 = value, 2 = out-tangent
    fn group(&self, key: usize, group: usize) -> &[f32] {
        let c = self.components;
        let start = match self.interpolation {
            Interpolation::CubicSpline => (key * 3 + group) * c,
            Interpolation::Linear | Interpolation::Step => key * c,
        };
        &self.output[start..start + c]
    }

    /// Interpolate the sampler at `time` for the given property
    ///
    /// Times before the first keyframe hold the first value, times after the
    /// last keyframe hold the last value. A time exactly on a keyframe
    /// returns that keyframe's value unchanged.
    pub fn sample(&self, time: f32, property: TargetProperty) -> PropertyValue {
        if self.components != property.components() {
            log::warn!(
                "Sampler of width {} cannot drive {:?}",
                self.components,
                property
            );
            return property.default_value();
        }
        let Some(bracket) = find_bracket(&self.input, time) else {
            return property.default_value();
        };

        if bracket.lower == bracket.upper || bracket.alpha <= 0.0 {
            return property.value_from(self.value(bracket.lower));
        }
        if bracket.alpha >= 1.0 {
            return property.value_from(self.value(bracket.upper));
        }

        let alpha = bracket.alpha;
        match self.interpolation {
            Interpolation::Step => property.value_from(self.value(bracket.lower)),
            Interpolation::Linear => match property {
                TargetProperty::Rotation => {
                    let q0 = Quat::from_slice(self.value(bracket.lower)).normalize();
                    let q1 = Quat::from_slice(self.value(bracket.upper)).normalize();
                    PropertyValue::Rotation(q0.slerp(q1, alpha).normalize())
                }
                TargetProperty::Translation | TargetProperty::Scale => {
                    let v0 = self.value(bracket.lower);
                    let v1 = self.value(bracket.upper);
                    let mut out = [0.0f32; 4];
                    for ((o, a), b) in out.iter_mut().zip(v0).zip(v1) {
                        *o = a * (1.0 - alpha) + b * alpha;
                    }
                    property.value_from(&out[..self.components])
                }
            },
            Interpolation::CubicSpline => {
                let dt = self.input[bracket.upper] - self.input[bracket.lower];
                let v0 = self.value(bracket.lower);
                let out_tangent = self.group(bracket.lower, 2);
                let v1 = self.value(bracket.upper);
                let in_tangent = self.group(bracket.upper, 0);
                let mut out = [0.0f32; 4];
                let points = v0.iter().zip(out_tangent).zip(v1).zip(in_tangent);
                for (o, (((p0, m0), p1), m1)) in out.iter_mut().zip(points) {
                    *o = hermite(*p0, m0 * dt, *p1, m1 * dt, alpha);
                }
                match property.value_from(&out[..self.components]) {
                    PropertyValue::Rotation(q) => PropertyValue::Rotation(q.normalize()),
                    value => value,
                }
            }
        }
    }
}

/// Binding of a sampler to a node property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationChannel {
    pub target_node: usize,
    pub target_property: TargetProperty,
    pub sampler: usize,
}

/// A named set of channels and the samplers they own
#[derive(Debug, Clone)]
pub struct AnimationClip {
    name: String,
    channels: Vec<AnimationChannel>,
    samplers: Vec<AnimationSampler>,
    duration: f32,
}

impl AnimationClip {
    /// Create a clip, checking that every channel points at a sampler of the right width
    pub fn new(
        name: impl Into<String>,
        channels: Vec<AnimationChannel>,
        samplers: Vec<AnimationSampler>,
    ) -> Result<Self> {
        let name = name.into();
        for (index, channel) in channels.iter().enumerate() {
            let sampler = samplers.get(channel.sampler).ok_or_else(|| {
                GltfError::ReferenceError(format!(
                    "clip '{}' channel {} references missing sampler {}",
                    name, index, channel.sampler
                ))
            })?;
            if sampler.components() != channel.target_property.components() {
                return Err(GltfError::ValidationError(format!(
                    "clip '{}' channel {} targets {:?} but its sampler has {} components",
                    name,
                    index,
                    channel.target_property,
                    sampler.components()
                )));
            }
        }

        let duration = samplers
            .iter()
            .map(AnimationSampler::last_time)
            .fold(0.0f32, f32::max);

        Ok(Self {
            name,
            channels,
            samplers,
            duration,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channels(&self) -> &[AnimationChannel] {
        &self.channels
    }

    pub fn samplers(&self) -> &[AnimationSampler] {
        &self.samplers
    }

    /// Last keyframe time over all samplers
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Write the pose at `time` onto the targeted nodes
    pub fn apply(&self, time: f32, nodes: &mut [Node]) {
        for channel in &self.channels {
            let Some(sampler) = self.samplers.get(channel.sampler) else {
                continue;
            };
            let Some(node) = nodes.get_mut(channel.target_node) else {
                log::trace!(
                    "Clip '{}' targets missing node {}",
                    self.name,
                    channel.target_node
                );
                continue;
            };
            node.apply(sampler.sample(time, channel.target_property));
        }
    }
}
