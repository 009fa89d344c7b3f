//! Camera graph: the watchable locations agents roam between.
//!
//! Cameras live in an arena inside [`CameraMap`] and are addressed by
//! [`CameraId`]. Adjacency is stored by name and may be one-way, which is how
//! hallways that only lead *into* the office are modeled. Each camera keeps
//! the agents currently standing there; the map also keeps the reverse
//! agent → camera index so a location lookup never scans the graph.
//!
//! ```
//! use nightwatch_logic::assets::ImageHandle;
//! use nightwatch_logic::camera::{Camera, CameraMap, HitRegion};
//!
//! let cam = |name: &str, links: &[&str]| {
//!     Camera::builder()
//!         .name(name)
//!         .background(ImageHandle::new(name))
//!         .region(HitRegion::new(0, 0, 10, 10))
//!         .connections(links.iter().copied())
//!         .build()
//!         .unwrap()
//! };
//! let map = CameraMap::new(
//!     ImageHandle::new("map.png"),
//!     "stage",
//!     vec![cam("stage", &["hall"]), cam("hall", &["stage"])],
//! )
//! .unwrap();
//! assert_eq!(map.connections("stage").unwrap(), ["hall".to_string()]);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assets::ImageHandle;
use crate::audio::AudioPlacement;
use crate::error::{ConfigError, GraphError};

/// Arena index of a camera inside its [`CameraMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub(crate) usize);

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "camera #{}", self.0)
    }
}

/// Stable identity of an animatronic for the length of a night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub(crate) usize);

impl AgentId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent #{}", self.0)
    }
}

/// Which office door a camera borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorSide {
    Left,
    Right,
}

/// Clickable rectangle of a camera button on the map, in map pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl HitRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        let dx = i64::from(px) - i64::from(self.x);
        let dy = i64::from(py) - i64::from(self.y);
        dx >= 0 && dy >= 0 && dx < i64::from(self.width) && dy < i64::from(self.height)
    }
}

/// One watchable location.
#[derive(Debug, Clone)]
pub struct Camera {
    name: String,
    background: ImageHandle,
    region: HitRegion,
    connections: Vec<String>,
    left_door: bool,
    right_door: bool,
    audio: AudioPlacement,
    occupants: Vec<AgentId>,
}

impl Camera {
    pub fn builder() -> CameraBuilder {
        CameraBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn background(&self) -> &ImageHandle {
        &self.background
    }

    pub fn region(&self) -> HitRegion {
        self.region
    }

    /// Outgoing edges, in declaration order.
    pub fn connections(&self) -> &[String] {
        &self.connections
    }

    pub fn is_left_door(&self) -> bool {
        self.left_door
    }

    pub fn is_right_door(&self) -> bool {
        self.right_door
    }

    /// The office door this camera borders, if any. Left wins if both are set.
    pub fn door(&self) -> Option<DoorSide> {
        if self.left_door {
            Some(DoorSide::Left)
        } else if self.right_door {
            Some(DoorSide::Right)
        } else {
            None
        }
    }

    pub fn audio(&self) -> AudioPlacement {
        self.audio
    }

    /// Agents at this camera, in arrival order.
    pub fn occupants(&self) -> &[AgentId] {
        &self.occupants
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.occupants.contains(&agent)
    }
}

/// Builder for [`Camera`]. Name, background and region are mandatory.
#[derive(Debug, Clone, Default)]
pub struct CameraBuilder {
    name: Option<String>,
    background: Option<ImageHandle>,
    region: Option<HitRegion>,
    connections: Vec<String>,
    left_door: bool,
    right_door: bool,
    audio: AudioPlacement,
}

impl CameraBuilder {
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn background(mut self, background: ImageHandle) -> Self {
        self.background = Some(background);
        self
    }

    pub fn region(mut self, region: HitRegion) -> Self {
        self.region = Some(region);
        self
    }

    pub fn connection(mut self, to: &str) -> Self {
        self.connections.push(to.to_string());
        self
    }

    pub fn connections<'a, I>(mut self, to: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.connections.extend(to.into_iter().map(str::to_string));
        self
    }

    pub fn left_door(mut self, flag: bool) -> Self {
        self.left_door = flag;
        self
    }

    pub fn right_door(mut self, flag: bool) -> Self {
        self.right_door = flag;
        self
    }

    pub fn audio(mut self, placement: AudioPlacement) -> Self {
        self.audio = placement;
        self
    }

    pub fn build(self) -> Result<Camera, ConfigError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(ConfigError::CameraMissingField("name"))?;
        let background = self
            .background
            .ok_or(ConfigError::CameraMissingField("background"))?;
        let region = self
            .region
            .ok_or(ConfigError::CameraMissingField("region"))?;

        let mut connections = Vec::with_capacity(self.connections.len());
        for to in self.connections {
            if !connections.contains(&to) {
                connections.push(to);
            }
        }

        Ok(Camera {
            name,
            background,
            region,
            connections,
            left_door: self.left_door,
            right_door: self.right_door,
            audio: self.audio,
            occupants: Vec::new(),
        })
    }
}

/// All cameras of one night plus the player's current selection.
#[derive(Debug, Clone)]
pub struct CameraMap {
    cameras: Vec<Camera>,
    by_name: HashMap<String, CameraId>,
    map_image: ImageHandle,
    selected: CameraId,
    locations: HashMap<AgentId, CameraId>,
}

impl CameraMap {
    /// Assemble a map. Names must be unique and every connection must name
    /// a camera of this map.
    pub fn new(
        map_image: ImageHandle,
        start_camera: &str,
        cameras: Vec<Camera>,
    ) -> Result<Self, ConfigError> {
        let mut by_name = HashMap::with_capacity(cameras.len());
        for (idx, cam) in cameras.iter().enumerate() {
            if by_name.insert(cam.name.clone(), CameraId(idx)).is_some() {
                return Err(ConfigError::DuplicateCamera(cam.name.clone()));
            }
        }
        for cam in &cameras {
            if let Some(missing) = cam.connections.iter().find(|c| !by_name.contains_key(*c)) {
                return Err(ConfigError::UnknownConnection {
                    from: cam.name.clone(),
                    to: missing.clone(),
                });
            }
        }
        let selected = *by_name
            .get(start_camera)
            .ok_or_else(|| ConfigError::UnknownStartCamera(start_camera.to_string()))?;

        Ok(Self {
            cameras,
            by_name,
            map_image,
            selected,
            locations: HashMap::new(),
        })
    }

    pub fn map_image(&self) -> &ImageHandle {
        &self.map_image
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CameraId, &Camera)> {
        self.cameras
            .iter()
            .enumerate()
            .map(|(idx, cam)| (CameraId(idx), cam))
    }

    pub fn id(&self, name: &str) -> Result<CameraId, GraphError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownCamera(name.to_string()))
    }

    pub fn get(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.get(id.0)
    }

    pub fn by_name(&self, name: &str) -> Result<&Camera, GraphError> {
        let id = self.id(name)?;
        Ok(&self.cameras[id.0])
    }

    /// Neighbor names of `name`, in declaration order.
    pub fn connections(&self, name: &str) -> Result<&[String], GraphError> {
        Ok(self.by_name(name)?.connections())
    }

    /// Neighbor ids of `id`. Unknown ids have no neighbors.
    pub fn neighbors(&self, id: CameraId) -> Vec<CameraId> {
        self.get(id)
            .map(|cam| {
                cam.connections
                    .iter()
                    .filter_map(|n| self.by_name.get(n).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn selected(&self) -> CameraId {
        self.selected
    }

    pub fn selected_camera(&self) -> &Camera {
        &self.cameras[self.selected.0]
    }

    /// Switch the live feed. Unknown names leave the selection unchanged.
    pub fn select(&mut self, name: &str) -> Result<CameraId, GraphError> {
        let id = self.id(name)?;
        self.selected = id;
        Ok(id)
    }

    /// Camera whose map button covers the given point.
    pub fn camera_at(&self, x: i32, y: i32) -> Option<CameraId> {
        self.iter()
            .find(|(_, cam)| cam.region.contains(x, y))
            .map(|(id, _)| id)
    }

    /// Where an agent currently stands.
    pub fn location(&self, agent: AgentId) -> Option<CameraId> {
        self.locations.get(&agent).copied()
    }

    /// Put an agent on the map, taking it off any camera it was on.
    pub fn place(&mut self, agent: AgentId, at: CameraId) -> Result<(), GraphError> {
        if at.0 >= self.cameras.len() {
            return Err(GraphError::UnknownCamera(at.to_string()));
        }
        if let Some(prev) = self.locations.insert(agent, at) {
            self.cameras[prev.0].occupants.retain(|a| *a != agent);
        }
        self.cameras[at.0].occupants.push(agent);
        Ok(())
    }

    /// Take an agent off the map entirely.
    pub fn remove(&mut self, agent: AgentId) -> Option<CameraId> {
        let at = self.locations.remove(&agent)?;
        self.cameras[at.0].occupants.retain(|a| *a != agent);
        Some(at)
    }

    /// Move `agent` from `from` to `to`.
    ///
    /// Fails without touching either camera if the agent is not recorded at
    /// `from`. Adjacency between `from` and `to` is **not** checked: callers
    /// pick `to` from `from`'s connections themselves.
    pub fn move_agent(
        &mut self,
        agent: AgentId,
        from: CameraId,
        to: CameraId,
    ) -> Result<(), GraphError> {
        if to.0 >= self.cameras.len() {
            return Err(GraphError::UnknownCamera(to.to_string()));
        }
        let source = self
            .cameras
            .get(from.0)
            .ok_or_else(|| GraphError::UnknownCamera(from.to_string()))?;
        let slot = source
            .occupants
            .iter()
            .position(|a| *a == agent)
            .ok_or_else(|| GraphError::AgentNotPresent {
                agent: agent.to_string(),
                camera: source.name.clone(),
            })?;

        self.cameras[from.0].occupants.remove(slot);
        self.cameras[to.0].occupants.push(agent);
        self.locations.insert(agent, to);
        Ok(())
    }
}
