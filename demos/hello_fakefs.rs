use std::io::{Read, Write};

use fakefs_kit::{FakeFs, fs};

fn main() {
    // declare the fixture: two files, contents known up front
    let vfs = FakeFs::new();
    vfs.add_file("/docs/first.txt", "Hello").unwrap();
    vfs.add_file("/second.txt", "World").unwrap();

    {
        // from here until the guard drops, all file access through
        // fakefs_kit::fs lands in the virtual model
        let _guard = vfs.patch().unwrap();

        let mut first = String::new();
        fs::File::open("/docs/first.txt")
            .unwrap()
            .read_to_string(&mut first)
            .unwrap();

        let second = fs::read_to_string("/second.txt").unwrap();

        println!("{first}, {second}!");

        // writes land in the virtual tree, never on disk
        let mut out = fs::File::create("/docs/greeting.txt").unwrap();
        out.write_all(format!("{first}, {second}!").as_bytes())
            .unwrap();
    }

    // the scope is over; assert on the model directly
    assert_eq!(
        vfs.read("/docs/greeting.txt").unwrap(),
        b"Hello, World!"
    );
    assert!(!std::path::Path::new("/docs/greeting.txt").exists());

    println!("all writes stayed in memory");
}
