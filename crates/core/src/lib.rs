pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod media_item;
    pub mod region;
    pub mod time_window;
    pub mod video_metadata;
}

pub mod blurring {
    pub mod domain {
        pub mod blur_error;
        pub mod blur_settings;
        pub mod frame_blurrer;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod image_reader;
        pub mod image_writer;
        pub mod video_reader;
        pub mod video_writer;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod batch_config;
    pub mod batch_dispatcher;
    pub mod blur_image_use_case;
    pub mod blur_video_use_case;
    pub mod export;
    pub mod media_processor;
    pub mod process_error;
}
