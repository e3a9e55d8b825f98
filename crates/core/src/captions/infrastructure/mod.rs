pub mod srt_writer;
