//! Per-thread scratch buffer for reading resources
use std::cell::RefCell;
use std::io::{self, Read};
use std::sync::Arc;

/// Growth unit of the scratch buffer.
pub const CHUNK_SIZE: usize = 4096;

// Starts at one chunk; doubles its chunk count whenever a read fills it.
thread_local! {
    static READ_BUFFER: RefCell<Vec<u8>> = RefCell::new(vec![0; CHUNK_SIZE]);
}

/// Reads `reader` to the end and returns an exactly-sized copy.
pub fn read_fully(reader: &mut dyn Read) -> io::Result<Arc<[u8]>> {
    READ_BUFFER.with(|cell| match cell.try_borrow_mut() {
        Ok(mut buffer) => fill(&mut buffer, reader),
        // Nested read on this thread: the shared buffer is busy.
        Err(_) => fill(&mut vec![0; CHUNK_SIZE], reader),
    })
}

fn fill(buffer: &mut Vec<u8>, reader: &mut dyn Read) -> io::Result<Arc<[u8]>> {
    let mut filled = 0;

    loop {
        if filled == buffer.len() {
            let chunks = (buffer.len() / CHUNK_SIZE).max(1);
            buffer.resize(chunks * 2 * CHUNK_SIZE, 0);
        }

        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(Arc::from(&buffer[..filled]))
}

/// Current size of this thread's scratch buffer.
pub fn scratch_capacity() -> usize {
    READ_BUFFER.with(|cell| cell.try_borrow().map(|buffer| buffer.len()).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out at most 1000 bytes per read.
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let limit = buf.len().min(1000);
            self.0.read(&mut buf[..limit])
        }
    }

    #[test]
    fn test_small_read_is_exact() {
        let bytes = read_fully(&mut Cursor::new(vec![1u8, 2, 3])).unwrap();
        assert_eq!(&*bytes, &[1, 2, 3]);
    }

    #[test]
    fn test_buffer_doubles_and_is_reused() {
        std::thread::spawn(|| {
            let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

            let bytes = read_fully(&mut Trickle(Cursor::new(data.clone()))).unwrap();
            assert_eq!(&*bytes, data.as_slice());
            // 4096 → 8192 → 16384
            assert_eq!(scratch_capacity(), 4 * CHUNK_SIZE);

            let small = read_fully(&mut Cursor::new(vec![7u8])).unwrap();
            assert_eq!(&*small, &[7]);
            assert_eq!(scratch_capacity(), 4 * CHUNK_SIZE);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_exact_chunk_boundary() {
        let data = vec![5u8; CHUNK_SIZE];
        let bytes = read_fully(&mut Cursor::new(data)).unwrap();
        assert_eq!(bytes.len(), CHUNK_SIZE);
    }
}
