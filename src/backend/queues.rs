// Queue family roles - graphics / present / compute
//
// A single pass over the adapter's queue family descriptors assigns all
// three roles, first match wins. Roles may alias the same family; the
// compute role prefers a family distinct from graphics when one exists
// anywhere in the list.

use anyhow::{bail, Result};
use ash::vk;

use super::device::Device;

/// Resolved family index per role. All three are guaranteed assigned;
/// roles may share an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyAssignment {
    pub graphics: u32,
    pub present: u32,
    pub compute: u32,
}

impl QueueFamilyAssignment {
    /// Family indices in role order with duplicates removed, preserving
    /// first occurrence. Device creation must request each family once,
    /// however many roles landed on it.
    pub fn distinct_families(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(3);
        for family in [self.graphics, self.present, self.compute] {
            if !families.contains(&family) {
                families.push(family);
            }
        }
        families
    }
}

/// Scan the family list once and resolve every role.
///
/// `supports_present` reports whether a family index can present to the
/// bound surface; it is a closure so the scan stays testable without a
/// live driver.
pub fn assign_queue_families<F>(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: F,
) -> Result<QueueFamilyAssignment>
where
    F: FnMut(u32) -> Result<bool>,
{
    let mut graphics: Option<u32> = None;
    let mut present: Option<u32> = None;
    let mut compute: Option<u32> = None;

    for (index, family) in families.iter().enumerate() {
        let index = index as u32;

        if graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            graphics = Some(index);
        }

        if present.is_none() && supports_present(index)? {
            present = Some(index);
        }

        // Keep scanning while compute is unassigned or stuck on the
        // graphics family; aliasing stands only if nothing better exists.
        if (compute.is_none() || compute == graphics)
            && family.queue_flags.contains(vk::QueueFlags::COMPUTE)
        {
            compute = Some(index);
        }
    }

    let (Some(graphics), Some(present), Some(compute)) = (graphics, present, compute) else {
        bail!(
            "No usable queue topology: graphics={:?} present={:?} compute={:?}",
            graphics,
            present,
            compute
        );
    };

    Ok(QueueFamilyAssignment {
        graphics,
        present,
        compute,
    })
}

/// Role-tagged queue handles fetched from the logical device. Handles
/// may reference the same hardware channel when roles alias; callers
/// own any cross-thread submission discipline.
pub struct QueueSet {
    pub graphics: vk::Queue,
    pub present: vk::Queue,
    pub compute: vk::Queue,
    assignment: QueueFamilyAssignment,
}

impl QueueSet {
    /// One handle per role, queue index 0 of the role's family.
    pub fn fetch(device: &Device, assignment: QueueFamilyAssignment) -> Self {
        let handle = device.handle();
        unsafe {
            Self {
                graphics: handle.get_device_queue(assignment.graphics, 0),
                present: handle.get_device_queue(assignment.present, 0),
                compute: handle.get_device_queue(assignment.compute, 0),
                assignment,
            }
        }
    }

    pub fn assignment(&self) -> QueueFamilyAssignment {
        self.assignment
    }

    /// Label each queue for tooling visibility.
    pub fn apply_debug_labels(&self, reporter: &super::debug::DebugReporter, device: &Device) {
        reporter.name_queue(device.handle(), self.graphics, "Graphics Queue");
        reporter.name_queue(device.handle(), self.present, "Present Queue");
        reporter.name_queue(device.handle(), self.compute, "Compute Queue");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            timestamp_valid_bits: 0,
            min_image_transfer_granularity: Default::default(),
        }
    }

    fn assign(
        families: &[vk::QueueFamilyProperties],
        present: &[u32],
    ) -> Result<QueueFamilyAssignment> {
        assign_queue_families(families, |index| Ok(present.contains(&index)))
    }

    #[test]
    fn roles_resolve_first_match() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
        ];
        // Only the last family can present.
        let assignment = assign(&families, &[2]).unwrap();
        assert_eq!(assignment.graphics, 0);
        assert_eq!(assignment.compute, 1);
        assert_eq!(assignment.present, 2);
    }

    #[test]
    fn single_family_aliases_all_roles() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)];
        let assignment = assign(&families, &[0]).unwrap();
        assert_eq!(assignment.graphics, 0);
        assert_eq!(assignment.present, 0);
        assert_eq!(assignment.compute, 0);
    }

    #[test]
    fn compute_upgrades_away_from_graphics() {
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::COMPUTE),
        ];
        let assignment = assign(&families, &[0]).unwrap();
        assert_eq!(assignment.graphics, 0);
        assert_eq!(assignment.compute, 1);
    }

    #[test]
    fn compute_keeps_distinct_family_once_found() {
        // Once compute sits on a non-graphics family it must not move.
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::COMPUTE),
        ];
        let assignment = assign(&families, &[0]).unwrap();
        assert_eq!(assignment.compute, 1);
    }

    #[test]
    fn all_roles_resolve_regardless_of_order() {
        let families = [
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let assignment = assign(&families, &[1]).unwrap();
        assert_eq!(assignment.graphics, 2);
        assert_eq!(assignment.present, 1);
        assert_eq!(assignment.compute, 0);
    }

    #[test]
    fn missing_graphics_fails() {
        let families = [family(vk::QueueFlags::COMPUTE)];
        assert!(assign(&families, &[0]).is_err());
    }

    #[test]
    fn missing_present_fails() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)];
        assert!(assign(&families, &[]).is_err());
    }

    #[test]
    fn missing_compute_fails() {
        let families = [family(vk::QueueFlags::GRAPHICS)];
        assert!(assign(&families, &[0]).is_err());
    }

    #[test]
    fn assignment_is_idempotent() {
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let first = assign(&families, &[0, 2]).unwrap();
        let second = assign(&families, &[0, 2]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_families_collapses_aliases() {
        let assignment = QueueFamilyAssignment {
            graphics: 0,
            present: 0,
            compute: 0,
        };
        assert_eq!(assignment.distinct_families(), vec![0]);

        let assignment = QueueFamilyAssignment {
            graphics: 0,
            present: 1,
            compute: 0,
        };
        assert_eq!(assignment.distinct_families(), vec![0, 1]);

        let assignment = QueueFamilyAssignment {
            graphics: 0,
            present: 2,
            compute: 1,
        };
        assert_eq!(assignment.distinct_families(), vec![0, 2, 1]);
    }
}
