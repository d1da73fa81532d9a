//! Virtual-to-physical qubit mapping.

use rustc_hash::FxHashMap;

use qmap_ir::{PhysicalQubit, VirtualQubit};

use crate::error::{RouteError, RouteResult};
use crate::topology::Topology;

/// Injective assignment of virtual qubits to physical qubits, with its inverse.
///
/// Physical qubits without an occupant are idle. The only mutations are
/// [`apply_swap`](Self::apply_swap), which exchanges the occupants of two
/// linked physical qubits, and [`allocate`](Self::allocate), which places a
/// virtual qubit on an idle physical qubit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// Map from virtual qubit to its physical position.
    virtual_to_physical: FxHashMap<VirtualQubit, PhysicalQubit>,
    /// Occupant of each physical qubit.
    physical_to_virtual: Vec<Option<VirtualQubit>>,
}

impl Mapping {
    /// Create an empty mapping for a device.
    pub fn empty(topology: &Topology) -> Self {
        Self {
            virtual_to_physical: FxHashMap::default(),
            physical_to_virtual: vec![None; topology.num_qubits() as usize],
        }
    }

    /// Create a mapping from explicit `(virtual, physical)` pairs.
    ///
    /// Fails if a physical qubit is outside the device, or if a virtual or
    /// physical qubit appears twice.
    pub fn new(
        topology: &Topology,
        assignment: impl IntoIterator<Item = (VirtualQubit, PhysicalQubit)>,
    ) -> RouteResult<Self> {
        let mut mapping = Self::empty(topology);
        for (virt, phys) in assignment {
            mapping.allocate(virt, phys)?;
        }
        Ok(mapping)
    }

    /// Map virtual qubit `k` to physical qubit `k` for each given qubit.
    pub fn identity(
        topology: &Topology,
        qubits: impl IntoIterator<Item = VirtualQubit>,
    ) -> RouteResult<Self> {
        Self::new(
            topology,
            qubits.into_iter().map(|v| (v, PhysicalQubit(v.0))),
        )
    }

    /// Place a virtual qubit on an idle physical qubit.
    pub fn allocate(&mut self, virt: VirtualQubit, phys: PhysicalQubit) -> RouteResult<()> {
        let slot = self.physical_to_virtual.get_mut(phys.index()).ok_or_else(|| {
            RouteError::InvalidMapping(format!("physical qubit {phys} is outside the device"))
        })?;
        if let Some(occupant) = *slot {
            return Err(RouteError::InvalidMapping(format!(
                "physical qubit {phys} already holds {occupant}"
            )));
        }
        if let Some(existing) = self.virtual_to_physical.get(&virt) {
            return Err(RouteError::InvalidMapping(format!(
                "virtual qubit {virt} is already placed on {existing}"
            )));
        }
        *slot = Some(virt);
        self.virtual_to_physical.insert(virt, phys);
        Ok(())
    }

    /// Physical position of a virtual qubit.
    #[inline]
    pub fn physical_of(&self, virt: VirtualQubit) -> Option<PhysicalQubit> {
        self.virtual_to_physical.get(&virt).copied()
    }

    /// Occupant of a physical qubit, `None` if idle or out of range.
    #[inline]
    pub fn virtual_of(&self, phys: PhysicalQubit) -> Option<VirtualQubit> {
        self.physical_to_virtual.get(phys.index()).copied().flatten()
    }

    /// Whether a physical qubit exists and holds no virtual qubit.
    pub fn is_idle(&self, phys: PhysicalQubit) -> bool {
        matches!(self.physical_to_virtual.get(phys.index()), Some(None))
    }

    /// Exchange the occupants of two linked physical qubits.
    ///
    /// Either side may be idle. Fails without modifying the mapping when
    /// the qubits are not adjacent in `topology`.
    pub fn apply_swap(
        &mut self,
        topology: &Topology,
        p1: PhysicalQubit,
        p2: PhysicalQubit,
    ) -> RouteResult<()> {
        if !topology.are_adjacent(p1, p2) {
            return Err(RouteError::NonAdjacentSwap { p1, p2 });
        }

        let v1 = self.physical_to_virtual[p1.index()];
        let v2 = self.physical_to_virtual[p2.index()];
        self.physical_to_virtual[p1.index()] = v2;
        self.physical_to_virtual[p2.index()] = v1;

        if let Some(v1) = v1 {
            self.virtual_to_physical.insert(v1, p2);
        }
        if let Some(v2) = v2 {
            self.virtual_to_physical.insert(v2, p1);
        }
        Ok(())
    }

    /// Number of placed virtual qubits.
    pub fn len(&self) -> usize {
        self.virtual_to_physical.len()
    }

    /// Whether no virtual qubit is placed.
    pub fn is_empty(&self) -> bool {
        self.virtual_to_physical.is_empty()
    }

    /// Number of physical qubits tracked.
    pub fn num_physical(&self) -> usize {
        self.physical_to_virtual.len()
    }

    /// Idle physical qubits in ascending order.
    pub fn idle_qubits(&self) -> impl Iterator<Item = PhysicalQubit> + '_ {
        self.physical_to_virtual
            .iter()
            .enumerate()
            .filter(|(_, occupant)| occupant.is_none())
            .map(|(p, _)| PhysicalQubit::from(p))
    }

    /// `(virtual, physical)` pairs in ascending physical order.
    pub fn iter(&self) -> impl Iterator<Item = (VirtualQubit, PhysicalQubit)> + '_ {
        self.physical_to_virtual
            .iter()
            .enumerate()
            .filter_map(|(p, occupant)| occupant.map(|v| (v, PhysicalQubit::from(p))))
    }

    /// Check that both directions agree and no physical qubit is shared.
    pub fn is_consistent(&self) -> bool {
        let occupied = self
            .physical_to_virtual
            .iter()
            .filter(|occupant| occupant.is_some())
            .count();
        occupied == self.virtual_to_physical.len()
            && self
                .virtual_to_physical
                .iter()
                .all(|(&v, &p)| self.virtual_of(p) == Some(v))
    }
}
