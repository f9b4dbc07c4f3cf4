use nalgebra::{Point3, Vector3};

/// A coordinate snapshot that can be written to a trajectory.
///
/// Structure models from other parts of a modeling stack implement this trait
/// to hand their coordinates to the writer without being copied into a
/// [`Frame`] first.
pub trait CoordinateFrame {
    /// Number of atoms in the snapshot.
    fn atom_count(&self) -> usize;

    /// Orthorhombic box lengths `(a, b, c)`, if the snapshot is periodic.
    fn periodic_box(&self) -> Option<Vector3<f64>>;

    /// Position of the atom at `index`.
    ///
    /// Callers only pass indices below [`atom_count`](Self::atom_count).
    fn coord(&self, index: usize) -> Point3<f32>;

    fn is_periodic(&self) -> bool {
        self.periodic_box().is_some()
    }
}

/// One time sample of a trajectory: single precision coordinates plus an
/// optional periodic box.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    /// Atom positions in Angstroms.
    pub coords: Vec<Point3<f32>>,
    /// Box lengths in Angstroms, present for periodic systems.
    pub periodic_box: Option<Vector3<f64>>,
}

impl Frame {
    pub fn new(coords: Vec<Point3<f32>>) -> Self {
        Self {
            coords,
            periodic_box: None,
        }
    }

    pub fn with_box(coords: Vec<Point3<f32>>, periodic_box: Vector3<f64>) -> Self {
        Self {
            coords,
            periodic_box: Some(periodic_box),
        }
    }

    /// Copies any [`CoordinateFrame`] into an owned frame.
    pub fn from_source<F: CoordinateFrame + ?Sized>(source: &F) -> Self {
        Self {
            coords: (0..source.atom_count()).map(|i| source.coord(i)).collect(),
            periodic_box: source.periodic_box(),
        }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

impl CoordinateFrame for Frame {
    fn atom_count(&self) -> usize {
        self.coords.len()
    }

    fn periodic_box(&self) -> Option<Vector3<f64>> {
        self.periodic_box
    }

    fn coord(&self, index: usize) -> Point3<f32> {
        self.coords[index]
    }
}

impl<T: CoordinateFrame + ?Sized> CoordinateFrame for &T {
    fn atom_count(&self) -> usize {
        (**self).atom_count()
    }

    fn periodic_box(&self) -> Option<Vector3<f64>> {
        (**self).periodic_box()
    }

    fn coord(&self, index: usize) -> Point3<f32> {
        (**self).coord(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lattice {
        spacing: f32,
        n: usize,
    }

    impl CoordinateFrame for Lattice {
        fn atom_count(&self) -> usize {
            self.n
        }
        fn periodic_box(&self) -> Option<Vector3<f64>> {
            None
        }
        fn coord(&self, index: usize) -> Point3<f32> {
            Point3::new(index as f32 * self.spacing, 0.0, 0.0)
        }
    }

    #[test]
    fn frame_reports_periodicity_from_box() {
        let coords = vec![Point3::new(1.0, 2.0, 3.0)];
        assert!(!Frame::new(coords.clone()).is_periodic());
        assert!(Frame::with_box(coords, Vector3::new(10.0, 11.0, 12.0)).is_periodic());
    }

    #[test]
    fn from_source_copies_coordinates_in_order() {
        let frame = Frame::from_source(&Lattice { spacing: 1.5, n: 3 });
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.coords[2], Point3::new(3.0, 0.0, 0.0));
        assert!(frame.periodic_box.is_none());
    }

    #[test]
    fn references_forward_to_the_underlying_frame() {
        let frame = Frame::with_box(vec![Point3::origin(); 4], Vector3::new(1.0, 2.0, 3.0));
        let by_ref: &Frame = &frame;
        assert_eq!(CoordinateFrame::atom_count(&by_ref), 4);
        assert_eq!(
            CoordinateFrame::periodic_box(&by_ref),
            Some(Vector3::new(1.0, 2.0, 3.0))
        );
    }
}
