use std::ffi::{c_char, CString};

use crossbeam_utils::thread::scope;

use native_copy::{
    layout::compute_layout, ManagedStruct, NativeRef, Registry, RegistryBuilder, Utf8Converter,
};

#[repr(C)]
struct NativeReading {
    sensor: u16,
    label: *const c_char,
    samples: [f32; 4],
}

#[repr(C)]
#[derive(ManagedStruct, Debug, Default, PartialEq)]
struct Reading {
    sensor: u16,
    label: String,
    samples: [f32; 4],
}

fn registry() -> Registry {
    let desc = compute_layout(&["uint16_t", "char*", "float[4]"]).unwrap();

    let mut builder = RegistryBuilder::new();
    builder
        .register_with_converter::<Reading, _>(&desc, Utf8Converter)
        .unwrap();
    builder.finalize()
}

#[test]
fn copies_from_many_threads() {
    const THREADS: usize = 8;
    const ITERATIONS: usize = 1000;

    let registry = registry();

    let labels = (0..THREADS)
        .map(|i| CString::new(format!("sensor-{}", i)).unwrap())
        .collect::<Vec<_>>();

    scope(|s| {
        for (i, label) in labels.iter().enumerate() {
            let registry = &registry;
            s.spawn(move |_| {
                let native = NativeReading {
                    sensor: i as u16,
                    label: label.as_ptr(),
                    samples: [i as f32; 4],
                };
                let src = unsafe { NativeRef::from_ref(&native) };

                let mut reading = Reading::default();
                for _ in 0..ITERATIONS {
                    registry.copy(&mut reading, src).unwrap();
                    assert_eq!(reading.sensor, i as u16);
                    assert_eq!(reading.label, format!("sensor-{}", i));
                    assert_eq!(reading.samples, [i as f32; 4]);
                }
            });
        }
    })
    .unwrap();
}

#[test]
fn registries_are_shared_by_clones() {
    let registry = registry();
    let clone = registry.clone();

    let label = CString::new("shared").unwrap();
    let native = NativeReading {
        sensor: 1,
        label: label.as_ptr(),
        samples: [0.5; 4],
    };
    let src = unsafe { NativeRef::from_ref(&native) };

    scope(|s| {
        let from_original = s.spawn(|_| registry.copy_new::<Reading>(src).unwrap());
        let from_clone = s.spawn(|_| clone.copy_new::<Reading>(src).unwrap());

        assert_eq!(from_original.join().unwrap(), from_clone.join().unwrap());
    })
    .unwrap();
}
