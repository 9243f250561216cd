fn main() {
    sftpnav_lib::run()
}
